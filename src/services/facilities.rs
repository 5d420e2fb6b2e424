use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Facility, FacilityInput, User};

fn not_found() -> AppError {
    AppError::NotFound("facility not found".to_string())
}

/// A facility the public may see and book: active and approved.
pub fn find_bookable(conn: &Connection, facility_id: &str) -> Result<Facility, AppError> {
    queries::get_facility(conn, facility_id)?
        .filter(Facility::is_listed)
        .ok_or_else(not_found)
}

pub fn create_facility(
    conn: &Connection,
    owner: &User,
    input: FacilityInput,
    now: DateTime<Utc>,
) -> Result<Facility, AppError> {
    if !owner.can_own_facilities() {
        return Err(AppError::Forbidden(
            "only facility owners can manage facilities".to_string(),
        ));
    }
    input.validate().map_err(AppError::Validation)?;

    let now = now.trunc_subsecs(0);
    let facility = Facility {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner.id.clone(),
        name: input.name.trim().to_string(),
        description: input.description,
        sports: input.sports,
        price_per_hour: input.price_per_hour,
        phone: input.phone,
        email: input.email,
        address: input.address,
        amenities: input.amenities,
        courts: input.courts,
        open_hours: input.open_hours,
        is_active: input.is_active,
        is_approved: true,
        rating: 0.0,
        rating_count: 0,
        created_at: now,
        updated_at: now,
    };
    queries::insert_facility(conn, &facility)?;

    tracing::info!(facility_id = %facility.id, owner_id = %owner.id, "facility created");
    Ok(facility)
}

pub fn update_facility(
    conn: &Connection,
    requester: &User,
    facility_id: &str,
    input: FacilityInput,
    now: DateTime<Utc>,
) -> Result<Facility, AppError> {
    if !requester.can_own_facilities() {
        return Err(AppError::Forbidden(
            "only facility owners can manage facilities".to_string(),
        ));
    }

    let existing = queries::get_facility(conn, facility_id)?.ok_or_else(not_found)?;
    if existing.owner_id != requester.id {
        return Err(AppError::Forbidden(
            "not authorized to update this facility".to_string(),
        ));
    }
    input.validate().map_err(AppError::Validation)?;

    queries::update_facility(conn, facility_id, &input, &now.trunc_subsecs(0))?;
    tracing::info!(facility_id, "facility updated");

    queries::get_facility(conn, facility_id)?.ok_or_else(not_found)
}

pub fn list_owned(conn: &Connection, owner: &User) -> Result<Vec<Facility>, AppError> {
    if !owner.can_own_facilities() {
        return Err(AppError::Forbidden(
            "only facility owners can manage facilities".to_string(),
        ));
    }
    Ok(queries::list_facilities_by_owner(conn, &owner.id)?)
}

pub fn set_approval(
    conn: &Connection,
    facility_id: &str,
    approved: bool,
    now: DateTime<Utc>,
) -> Result<Facility, AppError> {
    if !queries::set_facility_approval(conn, facility_id, approved, &now.trunc_subsecs(0))? {
        return Err(not_found());
    }
    tracing::info!(facility_id, approved, "facility approval changed");
    queries::get_facility(conn, facility_id)?.ok_or_else(not_found)
}
