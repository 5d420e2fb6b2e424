use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Address, Booking, BookingStatus, BookingView, Facility, FacilityInput, FacilitySearch,
    OpenHours, RatingSummary, Review, Role, Slot, User, UserStatus,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .map(|naive| naive.and_utc())
        .with_context(|| format!("invalid stored timestamp: {s}"))
}

fn to_json_list(items: &[String]) -> anyhow::Result<String> {
    serde_json::to_string(items).context("failed to encode list")
}

fn from_json_list(s: &str) -> anyhow::Result<Vec<String>> {
    serde_json::from_str(s).with_context(|| format!("invalid stored list: {s}"))
}

// ── Users ──

const USER_COLUMNS: &str =
    "u.id, u.full_name, u.email, u.role, u.status, u.api_token, u.created_at";

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let role: String = row.get(3)?;
    let status: String = row.get(4)?;
    let created_at: String = row.get(6)?;

    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        role: Role::parse(&role),
        status: UserStatus::parse(&status),
        api_token: row.get(5)?,
        created_at: parse_ts(&created_at)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, full_name, email, role, status, api_token, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            user.full_name,
            user.email,
            user.role.as_str(),
            user.status.as_str(),
            user.api_token,
            fmt_ts(&user.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    query_one_user(conn, "u.id = ?1", id)
}

pub fn get_user_by_token(conn: &Connection, token: &str) -> anyhow::Result<Option<User>> {
    query_one_user(conn, "u.api_token = ?1", token)
}

fn query_one_user(conn: &Connection, predicate: &str, value: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users u WHERE {predicate}"),
        params![value],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_users(
    conn: &Connection,
    role: Option<Role>,
    status: Option<UserStatus>,
) -> anyhow::Result<Vec<User>> {
    let mut sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE 1 = 1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(role) = role {
        params_vec.push(Box::new(role.as_str()));
        sql.push_str(&format!(" AND u.role = ?{}", params_vec.len()));
    }
    if let Some(status) = status {
        params_vec.push(Box::new(status.as_str()));
        sql.push_str(&format!(" AND u.status = ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY u.created_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_user_row(row)))?;

    let mut users = vec![];
    for row in rows {
        users.push(row??);
    }
    Ok(users)
}

pub fn update_user_status(conn: &Connection, id: &str, status: UserStatus) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

// ── Facilities ──

const FACILITY_COLUMNS: &str = "f.id, f.owner_id, f.name, f.description, f.sports, \
     f.price_per_hour, f.phone, f.email, f.address_line1, f.address_line2, f.city, f.state, \
     f.pincode, f.lat, f.lng, f.amenities, f.courts, f.open_time, f.close_time, f.is_active, \
     f.is_approved, f.rating, f.rating_count, f.created_at, f.updated_at";

fn parse_facility_row(row: &rusqlite::Row) -> anyhow::Result<Facility> {
    let sports: String = row.get(4)?;
    let amenities: String = row.get(15)?;
    let courts: String = row.get(16)?;
    let created_at: String = row.get(23)?;
    let updated_at: String = row.get(24)?;

    Ok(Facility {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        sports: from_json_list(&sports)?,
        price_per_hour: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        address: Address {
            line1: row.get(8)?,
            line2: row.get(9)?,
            city: row.get(10)?,
            state: row.get(11)?,
            pincode: row.get(12)?,
            lat: row.get(13)?,
            lng: row.get(14)?,
        },
        amenities: from_json_list(&amenities)?,
        courts: from_json_list(&courts)?,
        open_hours: OpenHours {
            open: row.get(17)?,
            close: row.get(18)?,
        },
        is_active: row.get(19)?,
        is_approved: row.get(20)?,
        rating: row.get(21)?,
        rating_count: row.get(22)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn collect_facilities(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> anyhow::Result<Vec<Facility>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(parse_facility_row(row)))?;

    let mut facilities = vec![];
    for row in rows {
        facilities.push(row??);
    }
    Ok(facilities)
}

pub fn insert_facility(conn: &Connection, facility: &Facility) -> anyhow::Result<()> {
    let addr = &facility.address;
    conn.execute(
        "INSERT INTO facilities (id, owner_id, name, description, sports, price_per_hour,
            phone, email, address_line1, address_line2, city, state, pincode, lat, lng,
            amenities, courts, open_time, close_time, is_active, is_approved, rating,
            rating_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
            ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
        params![
            facility.id,
            facility.owner_id,
            facility.name,
            facility.description,
            to_json_list(&facility.sports)?,
            facility.price_per_hour,
            facility.phone,
            facility.email,
            addr.line1,
            addr.line2,
            addr.city,
            addr.state,
            addr.pincode,
            addr.lat,
            addr.lng,
            to_json_list(&facility.amenities)?,
            to_json_list(&facility.courts)?,
            facility.open_hours.open,
            facility.open_hours.close,
            facility.is_active,
            facility.is_approved,
            facility.rating,
            facility.rating_count,
            fmt_ts(&facility.created_at),
            fmt_ts(&facility.updated_at),
        ],
    )?;
    Ok(())
}

/// Overwrites the owner-editable columns. Rating columns are untouched.
pub fn update_facility(
    conn: &Connection,
    id: &str,
    input: &FacilityInput,
    now: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let addr = &input.address;
    let count = conn.execute(
        "UPDATE facilities SET name = ?1, description = ?2, sports = ?3, price_per_hour = ?4,
            phone = ?5, email = ?6, address_line1 = ?7, address_line2 = ?8, city = ?9, state = ?10,
            pincode = ?11, lat = ?12, lng = ?13, amenities = ?14, courts = ?15, open_time = ?16,
            close_time = ?17, is_active = ?18, updated_at = ?19
         WHERE id = ?20",
        params![
            input.name.trim(),
            input.description,
            to_json_list(&input.sports)?,
            input.price_per_hour,
            input.phone,
            input.email,
            addr.line1,
            addr.line2,
            addr.city,
            addr.state,
            addr.pincode,
            addr.lat,
            addr.lng,
            to_json_list(&input.amenities)?,
            to_json_list(&input.courts)?,
            input.open_hours.open,
            input.open_hours.close,
            input.is_active,
            fmt_ts(now),
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_facility(conn: &Connection, id: &str) -> anyhow::Result<Option<Facility>> {
    let result = conn.query_row(
        &format!("SELECT {FACILITY_COLUMNS} FROM facilities f WHERE f.id = ?1"),
        params![id],
        |row| Ok(parse_facility_row(row)),
    );

    match result {
        Ok(facility) => Ok(Some(facility?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn search_facilities(
    conn: &Connection,
    search: &FacilitySearch,
) -> anyhow::Result<Vec<Facility>> {
    let mut sql = format!(
        "SELECT {FACILITY_COLUMNS} FROM facilities f WHERE f.is_active = 1 AND f.is_approved = 1"
    );
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(city) = search.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        params_vec.push(Box::new(city.to_string()));
        sql.push_str(&format!(" AND lower(f.city) = lower(?{})", params_vec.len()));
    }
    if let Some(q) = search.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        params_vec.push(Box::new(q.to_string()));
        sql.push_str(&format!(" AND instr(lower(f.name), lower(?{})) > 0", params_vec.len()));
    }
    sql.push_str(" ORDER BY f.created_at DESC");

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let mut facilities = collect_facilities(conn, &sql, params_refs.as_slice())?;

    if let Some(sport) = search.sport.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = sport.to_lowercase();
        facilities.retain(|f| f.sports.iter().any(|s| s.to_lowercase().contains(&needle)));
    }

    Ok(facilities)
}

pub fn list_facilities_by_owner(
    conn: &Connection,
    owner_id: &str,
) -> anyhow::Result<Vec<Facility>> {
    collect_facilities(
        conn,
        &format!(
            "SELECT {FACILITY_COLUMNS} FROM facilities f
             WHERE f.owner_id = ?1 ORDER BY f.created_at DESC"
        ),
        &[&owner_id],
    )
}

pub fn set_facility_approval(
    conn: &Connection,
    id: &str,
    approved: bool,
    now: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE facilities SET is_approved = ?1, updated_at = ?2 WHERE id = ?3",
        params![approved, fmt_ts(now), id],
    )?;
    Ok(count > 0)
}

/// Sum and count of every rating left on bookings of this facility.
pub fn rating_totals(conn: &Connection, facility_id: &str) -> anyhow::Result<(i64, i64)> {
    let totals = conn.query_row(
        "SELECT COALESCE(SUM(rating), 0), COUNT(rating) FROM bookings
         WHERE facility_id = ?1 AND rating IS NOT NULL",
        params![facility_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(totals)
}

pub fn set_facility_rating(
    conn: &Connection,
    facility_id: &str,
    summary: &RatingSummary,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE facilities SET rating = ?1, rating_count = ?2 WHERE id = ?3",
        params![summary.rating, summary.rating_count, facility_id],
    )?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "b.id, b.user_id, b.facility_id, b.start_time, b.end_time, b.amount, \
     b.status, b.selected_courts, b.sport, b.rating, b.review, b.reviewed_at, b.created_at, \
     b.updated_at, b.notes";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let start_time: String = row.get(3)?;
    let end_time: String = row.get(4)?;
    let status: String = row.get(6)?;
    let selected_courts: String = row.get(7)?;
    let reviewed_at: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(13)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        facility_id: row.get(2)?,
        start_time: parse_ts(&start_time)?,
        end_time: parse_ts(&end_time)?,
        amount: row.get(5)?,
        status: BookingStatus::parse(&status),
        selected_courts: from_json_list(&selected_courts)?,
        sport: row.get(8)?,
        notes: row.get(14)?,
        rating: row.get(9)?,
        review: row.get(10)?,
        reviewed_at: reviewed_at.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn parse_booking_view_row(row: &rusqlite::Row) -> anyhow::Result<BookingView> {
    Ok(BookingView {
        booking: parse_booking_row(row)?,
        facility_name: row.get(15)?,
    })
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, facility_id, start_time, end_time, amount, status,
            selected_courts, sport, rating, review, reviewed_at, created_at, updated_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            booking.id,
            booking.user_id,
            booking.facility_id,
            fmt_ts(&booking.start_time),
            fmt_ts(&booking.end_time),
            booking.amount,
            booking.status.as_str(),
            to_json_list(&booking.selected_courts)?,
            booking.sport,
            booking.rating,
            booking.review,
            booking.reviewed_at.as_ref().map(fmt_ts),
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
            booking.notes,
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-cancelled bookings of the facility whose interval overlaps `slot`.
pub fn find_overlapping_bookings(
    conn: &Connection,
    facility_id: &str,
    slot: &Slot,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         WHERE b.facility_id = ?1 AND b.status != 'cancelled'
           AND b.start_time < ?3 AND ?2 < b.end_time
         ORDER BY b.start_time ASC"
    ))?;

    let rows = stmt.query_map(
        params![facility_id, fmt_ts(&slot.start), fmt_ts(&slot.end)],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<BookingView>> {
    collect_booking_views(
        conn,
        &format!(
            "SELECT {BOOKING_COLUMNS}, f.name FROM bookings b
             JOIN facilities f ON f.id = b.facility_id
             WHERE b.user_id = ?1 ORDER BY b.start_time DESC"
        ),
        &[&user_id],
    )
}

/// Bookings across the owner's facilities; every booking when `owner_id` is `None`.
pub fn get_bookings_for_owner(
    conn: &Connection,
    owner_id: Option<&str>,
) -> anyhow::Result<Vec<BookingView>> {
    match owner_id {
        Some(owner_id) => collect_booking_views(
            conn,
            &format!(
                "SELECT {BOOKING_COLUMNS}, f.name FROM bookings b
                 JOIN facilities f ON f.id = b.facility_id
                 WHERE f.owner_id = ?1 ORDER BY b.start_time DESC"
            ),
            &[&owner_id],
        ),
        None => collect_booking_views(
            conn,
            &format!(
                "SELECT {BOOKING_COLUMNS}, f.name FROM bookings b
                 JOIN facilities f ON f.id = b.facility_id
                 ORDER BY b.start_time DESC"
            ),
            &[],
        ),
    }
}

fn collect_booking_views(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> anyhow::Result<Vec<BookingView>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(parse_booking_view_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    now: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_ts(now), id],
    )?;
    Ok(count > 0)
}

/// Writes the review only if the booking has none yet.
pub fn set_booking_review(
    conn: &Connection,
    id: &str,
    rating: u8,
    review: Option<&str>,
    now: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let now = fmt_ts(now);
    let count = conn.execute(
        "UPDATE bookings SET rating = ?1, review = ?2, reviewed_at = ?3, updated_at = ?3
         WHERE id = ?4 AND rating IS NULL",
        params![rating, review, now, id],
    )?;
    Ok(count > 0)
}

pub fn get_facility_reviews(conn: &Connection, facility_id: &str) -> anyhow::Result<Vec<Review>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.user_id, u.full_name, b.rating, b.review, b.reviewed_at, b.sport
         FROM bookings b
         JOIN users u ON u.id = b.user_id
         WHERE b.facility_id = ?1 AND b.rating IS NOT NULL
         ORDER BY b.reviewed_at DESC",
    )?;

    let rows = stmt.query_map(params![facility_id], |row| {
        let reviewed_at: String = row.get(5)?;
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, Option<String>>(4)?,
            reviewed_at,
            row.get::<_, Option<String>>(6)?,
        ))
    })?;

    let mut reviews = vec![];
    for row in rows {
        let (booking_id, user_id, user_name, rating, review, reviewed_at, sport) = row?;
        reviews.push(Review {
            booking_id,
            user_id,
            user_name,
            rating,
            review,
            reviewed_at: parse_ts(&reviewed_at)?,
            sport,
        });
    }
    Ok(reviews)
}

// ── Favorites ──

pub fn add_favorite(conn: &Connection, user_id: &str, facility_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT OR IGNORE INTO favorites (user_id, facility_id) VALUES (?1, ?2)",
        params![user_id, facility_id],
    )?;
    Ok(count > 0)
}

pub fn remove_favorite(
    conn: &Connection,
    user_id: &str,
    facility_id: &str,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM favorites WHERE user_id = ?1 AND facility_id = ?2",
        params![user_id, facility_id],
    )?;
    Ok(count > 0)
}

pub fn list_favorites(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Facility>> {
    collect_facilities(
        conn,
        &format!(
            "SELECT {FACILITY_COLUMNS} FROM favorites fav
             JOIN facilities f ON f.id = fav.facility_id
             WHERE fav.user_id = ?1
             ORDER BY fav.created_at DESC, f.name ASC"
        ),
        &[&user_id],
    )
}
