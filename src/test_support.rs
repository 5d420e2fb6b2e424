//! Fixtures shared by unit tests.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::db::{self, queries};
use crate::models::{Address, Booking, BookingStatus, Facility, OpenHours, Role, User, UserStatus};

pub fn setup_db() -> Connection {
    db::init_db(":memory:").unwrap()
}

pub fn at(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .unwrap()
        .and_utc()
}

pub fn seed_user_with_role(conn: &Connection, name: &str, role: Role) -> User {
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        full_name: name.to_string(),
        email: format!("{}@example.com", uuid::Uuid::new_v4()),
        role,
        status: UserStatus::Active,
        api_token: uuid::Uuid::new_v4().to_string(),
        created_at: at("2026-01-01 00:00"),
    };
    queries::insert_user(conn, &user).unwrap();
    user
}

pub fn seed_user(conn: &Connection, name: &str) -> User {
    seed_user_with_role(conn, name, Role::User)
}

pub fn seed_facility(conn: &Connection, owner_id: &str, price_per_hour: f64) -> Facility {
    let facility = Facility {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        name: "Smash Arena".to_string(),
        description: None,
        sports: vec!["Badminton".to_string()],
        price_per_hour,
        phone: None,
        email: None,
        address: Address {
            line1: "12 Ring Road".to_string(),
            line2: None,
            city: "Pune".to_string(),
            state: "MH".to_string(),
            pincode: "411001".to_string(),
            lat: None,
            lng: None,
        },
        amenities: vec![],
        courts: vec!["Court 1".to_string(), "Court 2".to_string()],
        open_hours: OpenHours::default(),
        is_active: true,
        is_approved: true,
        rating: 0.0,
        rating_count: 0,
        created_at: at("2026-01-01 00:00"),
        updated_at: at("2026-01-01 00:00"),
    };
    queries::insert_facility(conn, &facility).unwrap();
    facility
}

pub fn seed_booking(
    conn: &Connection,
    user_id: &str,
    facility_id: &str,
    start: &str,
    end: &str,
    status: BookingStatus,
) -> Booking {
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        facility_id: facility_id.to_string(),
        start_time: at(start),
        end_time: at(end),
        amount: 0.0,
        status,
        selected_courts: vec!["Court 1".to_string()],
        sport: Some("Badminton".to_string()),
        notes: None,
        rating: None,
        review: None,
        reviewed_at: None,
        created_at: at("2026-01-01 00:00"),
        updated_at: at("2026-01-01 00:00"),
    };
    queries::insert_booking(conn, &booking).unwrap();
    booking
}
