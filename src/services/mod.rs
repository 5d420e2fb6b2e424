pub mod bookings;
pub mod facilities;
pub mod scheduling;
pub mod users;
