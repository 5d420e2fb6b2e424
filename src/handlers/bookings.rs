use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth::AuthUser;
use crate::models::Slot;
use crate::services::bookings::{self, NewBooking};
use crate::services::{facilities, scheduling};
use crate::state::AppState;

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    body: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(body) = body?;
    let booking = {
        let mut db = state.conn()?;
        bookings::create_booking(&mut db, &user.id, body, Utc::now())?
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "booking": booking })),
    ))
}

// GET /bookings/mine
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let bookings = {
        let db = state.conn()?;
        queries::get_bookings_for_user(&db, &user.id)?
    };

    Ok(Json(json!({ "success": true, "bookings": bookings })))
}

// GET /bookings/owner
pub async fn owner_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    if !user.can_own_facilities() {
        return Err(AppError::Forbidden(
            "only facility owners can view venue bookings".to_string(),
        ));
    }

    let owner_filter = (!user.is_admin()).then_some(user.id.as_str());
    let bookings = {
        let db = state.conn()?;
        queries::get_bookings_for_owner(&db, owner_filter)?
    };

    Ok(Json(json!({ "success": true, "bookings": bookings })))
}

// PATCH /bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let policy = state.booking_policy();
    let booking = {
        let mut db = state.conn()?;
        bookings::cancel_booking(&mut db, &user.id, &id, &policy, Utc::now())?
    };

    Ok(Json(json!({ "success": true, "booking": booking })))
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: Option<i64>,
    pub review: Option<String>,
}

// PATCH /bookings/:id/review
pub async fn review_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body?;
    let booking = {
        let mut db = state.conn()?;
        bookings::submit_review(&mut db, &user.id, &id, body.rating, body.review, Utc::now())?
    };

    Ok(Json(json!({ "success": true, "booking": booking })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub facility_id: Option<String>,
    /// Calendar day in UTC. Clients in other zones must convert their local
    /// day to UTC bounds themselves; `startTime`/`endTime` carry an offset.
    pub date: Option<NaiveDate>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

// GET /bookings/availability
//
// `existingBookings` lists the facility's bookings overlapping the UTC day
// named by `date`, or the conflicting bookings when `date` is absent.
pub async fn availability(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let (Some(facility_id), Some(start), Some(end)) =
        (query.facility_id, query.start_time, query.end_time)
    else {
        return Err(AppError::validation(
            "facilityId, startTime and endTime are required",
        ));
    };
    let slot = Slot::new(start, end)
        .ok_or_else(|| AppError::validation("end time must be after start time"))?;

    let db = state.conn()?;
    let facility = facilities::find_bookable(&db, &facility_id)?;
    let report = scheduling::check_availability(&db, &facility.id, &slot)?;

    let existing = match query.date.and_then(day_slot) {
        Some(day) => queries::find_overlapping_bookings(&db, &facility.id, &day)?,
        None => report.conflicting.clone(),
    };
    let available_courts = if report.available {
        facility.courts.clone()
    } else {
        vec![]
    };

    Ok(Json(json!({
        "success": true,
        "available": report.available,
        "conflictingCount": report.conflicting_count(),
        "availableCourts": available_courts,
        "existingBookings": existing,
    })))
}

/// The UTC calendar day `[00:00, next 00:00)`.
fn day_slot(date: NaiveDate) -> Option<Slot> {
    let start = date.and_hms_opt(0, 0, 0)?.and_utc();
    let end = date.succ_opt()?.and_hms_opt(0, 0, 0)?.and_utc();
    Slot::new(start, end)
}

// GET /bookings/facility/:facilityId/reviews
pub async fn facility_reviews(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (reviews, summary) = {
        let db = state.conn()?;
        bookings::facility_reviews(&db, &facility_id)?
    };

    Ok(Json(json!({
        "success": true,
        "reviews": reviews,
        "averageRating": summary.rating,
        "totalReviews": summary.rating_count,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_slot_spans_one_day() {
        let day = day_slot(NaiveDate::from_ymd_opt(2030, 12, 31).unwrap()).unwrap();
        assert_eq!(day.duration_hours(), 24.0);
        assert_eq!(day.start.format("%Y-%m-%d").to_string(), "2030-12-31");
        assert_eq!(day.end.format("%Y-%m-%d").to_string(), "2031-01-01");
    }
}
