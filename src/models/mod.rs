pub mod booking;
pub mod facility;
pub mod hours;
pub mod review;
pub mod slot;
pub mod user;

pub use booking::{Booking, BookingStatus, BookingView, MAX_NOTES_CHARS, MAX_REVIEW_CHARS};
pub use facility::{Address, Facility, FacilityInput, FacilitySearch};
pub use hours::OpenHours;
pub use review::{RatingSummary, Review};
pub use slot::Slot;
pub use user::{Role, User, UserStatus};
