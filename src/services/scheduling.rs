use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Slot};

pub const SLOT_TAKEN: &str = "selected time slot is no longer available";

#[derive(Debug)]
pub struct AvailabilityReport {
    pub available: bool,
    pub conflicting: Vec<Booking>,
}

impl AvailabilityReport {
    pub fn conflicting_count(&self) -> usize {
        self.conflicting.len()
    }
}

/// Read-only view of whether `slot` is free on the facility. Creation
/// re-checks inside its own transaction, so this answer is advisory.
pub fn check_availability(
    conn: &Connection,
    facility_id: &str,
    slot: &Slot,
) -> anyhow::Result<AvailabilityReport> {
    let conflicting = queries::find_overlapping_bookings(conn, facility_id, slot)?;
    Ok(AvailabilityReport {
        available: conflicting.is_empty(),
        conflicting,
    })
}

pub fn ensure_slot_free(conn: &Connection, facility_id: &str, slot: &Slot) -> Result<(), AppError> {
    let report = check_availability(conn, facility_id, slot)?;
    if !report.available {
        tracing::info!(
            facility_id,
            conflicts = report.conflicting_count(),
            "slot conflict"
        );
        return Err(AppError::Conflict(SLOT_TAKEN.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use crate::test_support::{at, seed_booking, seed_facility, seed_user, setup_db};

    fn slot(start: &str, end: &str) -> Slot {
        Slot::new(at(start), at(end)).unwrap()
    }

    #[test]
    fn test_empty_facility_is_available() {
        let conn = setup_db();
        let owner = seed_user(&conn, "owner");
        let facility = seed_facility(&conn, &owner.id, 500.0);

        let report =
            check_availability(&conn, &facility.id, &slot("2030-01-01 10:00", "2030-01-01 11:00"))
                .unwrap();
        assert!(report.available);
        assert_eq!(report.conflicting_count(), 0);
    }

    #[test]
    fn test_overlap_reports_conflict() {
        let conn = setup_db();
        let owner = seed_user(&conn, "owner");
        let player = seed_user(&conn, "player");
        let facility = seed_facility(&conn, &owner.id, 500.0);
        seed_booking(
            &conn,
            &player.id,
            &facility.id,
            "2030-01-01 10:00",
            "2030-01-01 12:00",
            BookingStatus::Confirmed,
        );

        let report =
            check_availability(&conn, &facility.id, &slot("2030-01-01 11:00", "2030-01-01 13:00"))
                .unwrap();
        assert!(!report.available);
        assert_eq!(report.conflicting_count(), 1);

        let overlapping = slot("2030-01-01 11:00", "2030-01-01 13:00");
        let err = ensure_slot_free(&conn, &facility.id, &overlapping).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_adjacent_slot_is_free() {
        let conn = setup_db();
        let owner = seed_user(&conn, "owner");
        let player = seed_user(&conn, "player");
        let facility = seed_facility(&conn, &owner.id, 500.0);
        seed_booking(
            &conn,
            &player.id,
            &facility.id,
            "2030-01-01 10:00",
            "2030-01-01 12:00",
            BookingStatus::Confirmed,
        );

        let after = slot("2030-01-01 12:00", "2030-01-01 13:00");
        let before = slot("2030-01-01 09:00", "2030-01-01 10:00");
        assert!(ensure_slot_free(&conn, &facility.id, &after).is_ok());
        assert!(ensure_slot_free(&conn, &facility.id, &before).is_ok());
    }

    #[test]
    fn test_cancelled_booking_does_not_block() {
        let conn = setup_db();
        let owner = seed_user(&conn, "owner");
        let player = seed_user(&conn, "player");
        let facility = seed_facility(&conn, &owner.id, 500.0);
        seed_booking(
            &conn,
            &player.id,
            &facility.id,
            "2030-01-01 10:00",
            "2030-01-01 12:00",
            BookingStatus::Cancelled,
        );

        let report =
            check_availability(&conn, &facility.id, &slot("2030-01-01 10:00", "2030-01-01 12:00"))
                .unwrap();
        assert!(report.available);
    }

    #[test]
    fn test_other_facility_does_not_block() {
        let conn = setup_db();
        let owner = seed_user(&conn, "owner");
        let player = seed_user(&conn, "player");
        let court_a = seed_facility(&conn, &owner.id, 500.0);
        let court_b = seed_facility(&conn, &owner.id, 300.0);
        seed_booking(
            &conn,
            &player.id,
            &court_a.id,
            "2030-01-01 10:00",
            "2030-01-01 12:00",
            BookingStatus::Confirmed,
        );

        let report =
            check_availability(&conn, &court_b.id, &slot("2030-01-01 10:00", "2030-01-01 12:00"))
                .unwrap();
        assert!(report.available);
    }
}
