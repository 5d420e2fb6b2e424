//! Booking lifecycle: creation behind a slot-conflict check, self-service
//! cancellation, and one-shot reviews that keep the facility's aggregate
//! rating in step with its rated bookings.
//!
//! Every mutating operation runs in an `IMMEDIATE` transaction. SQLite takes
//! the write lock at `BEGIN`, so the read that validates a booking and the
//! write that depends on it cannot interleave with another writer.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingStatus, RatingSummary, Review, Slot, MAX_NOTES_CHARS, MAX_REVIEW_CHARS,
};
use crate::services::{facilities, scheduling};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    #[serde(alias = "facilityId")]
    pub facility: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub selected_courts: Vec<String>,
    pub sport: Option<String>,
    pub notes: Option<String>,
}

/// Upper bound on the cancellation cutoff: one week.
pub const MAX_CANCEL_CUTOFF_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    /// Cancellation closes this long before the booking starts.
    pub cancel_cutoff: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            cancel_cutoff: Duration::hours(1),
        }
    }
}

impl BookingPolicy {
    /// Out-of-range values are clamped to `0..=MAX_CANCEL_CUTOFF_MINUTES`.
    pub fn from_minutes(minutes: i64) -> Self {
        let minutes = minutes.clamp(0, MAX_CANCEL_CUTOFF_MINUTES);
        Self {
            cancel_cutoff: Duration::try_minutes(minutes).unwrap_or_else(|| Duration::hours(1)),
        }
    }

    fn cutoff_label(&self) -> String {
        let minutes = self.cancel_cutoff.num_minutes();
        match (minutes / 60, minutes % 60) {
            (1, 0) => "1 hour".to_string(),
            (h, 0) => format!("{h} hours"),
            _ => format!("{minutes} minutes"),
        }
    }
}

pub fn create_booking(
    conn: &mut Connection,
    user_id: &str,
    req: NewBooking,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    let now = now.trunc_subsecs(0);

    let (Some(facility_id), Some(start), Some(end), Some(amount)) = (
        req.facility.filter(|f| !f.trim().is_empty()),
        req.start_time,
        req.end_time,
        req.amount,
    ) else {
        return Err(AppError::validation("missing required fields"));
    };

    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::validation("amount must be a non-negative number"));
    }

    let notes = req
        .notes
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    if notes
        .as_deref()
        .is_some_and(|text| text.chars().count() > MAX_NOTES_CHARS)
    {
        return Err(AppError::Validation(format!(
            "notes cannot exceed {MAX_NOTES_CHARS} characters"
        )));
    }

    let slot = Slot::new(start.trunc_subsecs(0), end.trunc_subsecs(0))
        .ok_or_else(|| AppError::validation("end time must be after start time"))?;

    if slot.start <= now {
        return Err(AppError::validation("booking time must be in the future"));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let facility = facilities::find_bookable(&tx, &facility_id)?;
    scheduling::ensure_slot_free(&tx, &facility.id, &slot)?;

    let charged = ((facility.price_per_hour * slot.duration_hours()) * 100.0).round() / 100.0;
    if (charged - amount).abs() > 0.005 {
        tracing::warn!(
            facility_id = %facility.id,
            client_amount = amount,
            charged,
            "client amount differs from facility price, using facility price"
        );
    }

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        facility_id: facility.id,
        start_time: slot.start,
        end_time: slot.end,
        amount: charged,
        status: BookingStatus::Confirmed,
        selected_courts: req.selected_courts,
        sport: req.sport.filter(|s| !s.trim().is_empty()),
        notes,
        rating: None,
        review: None,
        reviewed_at: None,
        created_at: now,
        updated_at: now,
    };
    queries::insert_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        facility_id = %booking.facility_id,
        user_id,
        "booking created"
    );
    Ok(booking)
}

pub fn cancel_booking(
    conn: &mut Connection,
    requester_id: &str,
    booking_id: &str,
    policy: &BookingPolicy,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    let now = now.trunc_subsecs(0);
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut booking = load_owned(&tx, requester_id, booking_id, "cancel")?;

    match booking.status {
        BookingStatus::Cancelled => return Err(AppError::validation("already cancelled")),
        BookingStatus::Completed => {
            return Err(AppError::validation("completed bookings cannot be cancelled"))
        }
        BookingStatus::Pending | BookingStatus::Confirmed => {}
    }

    if now >= booking.start_time {
        return Err(AppError::validation("cannot cancel past bookings"));
    }
    let closes_at = booking.start_time.checked_sub_signed(policy.cancel_cutoff);
    if !matches!(closes_at, Some(closes_at) if now < closes_at) {
        return Err(AppError::Validation(format!(
            "must cancel at least {} before start",
            policy.cutoff_label()
        )));
    }

    queries::update_booking_status(&tx, &booking.id, BookingStatus::Cancelled, &now)?;
    tx.commit()?;

    booking.status = BookingStatus::Cancelled;
    booking.updated_at = now;

    tracing::info!(booking_id = %booking.id, "booking cancelled");
    Ok(booking)
}

pub fn submit_review(
    conn: &mut Connection,
    requester_id: &str,
    booking_id: &str,
    rating: Option<i64>,
    review: Option<String>,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    let now = now.trunc_subsecs(0);

    let rating = match rating {
        Some(r @ 1..=5) => r as u8,
        _ => return Err(AppError::validation("rating must be between 1 and 5")),
    };

    let review = review
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    if review
        .as_deref()
        .is_some_and(|text| text.chars().count() > MAX_REVIEW_CHARS)
    {
        return Err(AppError::Validation(format!(
            "review cannot exceed {MAX_REVIEW_CHARS} characters"
        )));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut booking = load_owned(&tx, requester_id, booking_id, "review")?;

    if booking.rating.is_some() {
        return Err(AppError::validation("already reviewed"));
    }
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::validation("cannot review a cancelled booking"));
    }
    if now < booking.start_time {
        return Err(AppError::validation("can only review after booking date"));
    }

    if !queries::set_booking_review(&tx, &booking.id, rating, review.as_deref(), &now)? {
        return Err(AppError::validation("already reviewed"));
    }
    let summary = recompute_facility_rating(&tx, &booking.facility_id)?;
    tx.commit()?;

    booking.rating = Some(rating);
    booking.review = review;
    booking.reviewed_at = Some(now);
    booking.updated_at = now;

    tracing::info!(
        booking_id = %booking.id,
        facility_id = %booking.facility_id,
        rating,
        facility_rating = summary.rating,
        rating_count = summary.rating_count,
        "review submitted"
    );
    Ok(booking)
}

/// Rebuilds the facility aggregate from every rated booking. Call inside the
/// same transaction as the write that changed the ratings.
pub fn recompute_facility_rating(
    conn: &Connection,
    facility_id: &str,
) -> anyhow::Result<RatingSummary> {
    let (sum, count) = queries::rating_totals(conn, facility_id)?;
    let summary = RatingSummary::from_totals(sum, count);
    queries::set_facility_rating(conn, facility_id, &summary)?;
    Ok(summary)
}

pub fn facility_reviews(
    conn: &Connection,
    facility_id: &str,
) -> Result<(Vec<Review>, RatingSummary), AppError> {
    if queries::get_facility(conn, facility_id)?.is_none() {
        return Err(AppError::NotFound("facility not found".to_string()));
    }
    let reviews = queries::get_facility_reviews(conn, facility_id)?;
    let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    let summary = RatingSummary::from_totals(sum, reviews.len() as i64);
    Ok((reviews, summary))
}

fn load_owned(
    conn: &Connection,
    requester_id: &str,
    booking_id: &str,
    action: &str,
) -> Result<Booking, AppError> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    if booking.user_id != requester_id {
        tracing::warn!(booking_id, requester_id, action, "booking access denied");
        return Err(AppError::Forbidden(format!(
            "not authorized to {action} this booking"
        )));
    }
    Ok(booking)
}
