use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::OpenHours;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub sports: Vec<String>,
    pub price_per_hour: f64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Address,
    pub amenities: Vec<String>,
    pub courts: Vec<String>,
    pub open_hours: OpenHours,
    pub is_active: bool,
    pub is_approved: bool,
    /// Average of all booking ratings, one decimal. Maintained by review
    /// submission only.
    pub rating: f64,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Facility {
    pub fn is_listed(&self) -> bool {
        self.is_active && self.is_approved
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Owner-editable facility fields. Carries no rating fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sports: Vec<String>,
    pub price_per_hour: f64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Address,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub courts: Vec<String>,
    #[serde(default)]
    pub open_hours: OpenHours,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl FacilityInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("facility name is required".to_string());
        }
        let addr = &self.address;
        if [&addr.line1, &addr.city, &addr.state, &addr.pincode]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err("address line1, city, state and pincode are required".to_string());
        }
        if !self.price_per_hour.is_finite() || self.price_per_hour < 0.0 {
            return Err("price per hour must be a non-negative number".to_string());
        }
        self.open_hours.validate().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacilitySearch {
    pub city: Option<String>,
    pub sport: Option<String>,
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> FacilityInput {
        FacilityInput {
            name: "Smash Arena".to_string(),
            description: None,
            sports: vec!["Badminton".to_string()],
            price_per_hour: 500.0,
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
            courts: vec!["Court 1".to_string()],
            open_hours: OpenHours::default(),
            is_active: true,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut i = input();
        i.name = "  ".to_string();
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_missing_city_rejected() {
        let mut i = input();
        i.address.city.clear();
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut i = input();
        i.price_per_hour = -1.0;
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_bad_hours_rejected() {
        let mut i = input();
        i.open_hours = OpenHours {
            open: "23:00".to_string(),
            close: "08:00".to_string(),
        };
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_input_ignores_rating_fields() {
        let json = r#"{
            "name": "Smash Arena",
            "pricePerHour": 400,
            "address": {"line1": "a", "city": "b", "state": "c", "pincode": "d"},
            "rating": 5,
            "ratingCount": 999
        }"#;
        let parsed: FacilityInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.price_per_hour, 400.0);
        assert!(parsed.is_active);
        assert_eq!(parsed.open_hours, OpenHours::default());
    }
}
