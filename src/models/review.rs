use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub booking_id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub review: Option<String>,
    pub reviewed_at: DateTime<Utc>,
    pub sport: Option<String>,
}

/// Aggregate rating of a facility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub rating: f64,
    pub rating_count: i64,
}

impl RatingSummary {
    pub fn from_totals(sum: i64, count: i64) -> Self {
        if count == 0 {
            return Self {
                rating: 0.0,
                rating_count: 0,
            };
        }
        let average = sum as f64 / count as f64;
        Self {
            rating: (average * 10.0).round() / 10.0,
            rating_count: count,
        }
    }
}
