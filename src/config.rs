use std::env;

use crate::services::bookings::MAX_CANCEL_CUTOFF_MINUTES;

const DEFAULT_CANCEL_CUTOFF_MINUTES: i64 = 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    pub cancel_cutoff_minutes: i64,
    pub admin_bootstrap_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "courtside.db".to_string()),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            cancel_cutoff_minutes: parse_cutoff_minutes(
                env::var("CANCEL_CUTOFF_MINUTES").ok().as_deref(),
            ),
            admin_bootstrap_token: env::var("ADMIN_BOOTSTRAP_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "courtside.db".to_string(),
            cors_origin: "*".to_string(),
            cancel_cutoff_minutes: DEFAULT_CANCEL_CUTOFF_MINUTES,
            admin_bootstrap_token: None,
        }
    }
}

/// Negative or unparsable values fall back to the default; large ones are
/// capped at a week.
fn parse_cutoff_minutes(raw: Option<&str>) -> i64 {
    match raw.map(str::trim).and_then(|v| v.parse::<i64>().ok()) {
        Some(minutes) if minutes >= 0 => minutes.min(MAX_CANCEL_CUTOFF_MINUTES),
        _ => DEFAULT_CANCEL_CUTOFF_MINUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_defaults() {
        assert_eq!(parse_cutoff_minutes(None), 60);
        assert_eq!(parse_cutoff_minutes(Some("soon")), 60);
        assert_eq!(parse_cutoff_minutes(Some("-5")), 60);
    }

    #[test]
    fn test_cutoff_parsed() {
        assert_eq!(parse_cutoff_minutes(Some("0")), 0);
        assert_eq!(parse_cutoff_minutes(Some(" 120 ")), 120);
    }

    #[test]
    fn test_huge_cutoff_capped() {
        assert_eq!(
            parse_cutoff_minutes(Some("9223372036854775807")),
            MAX_CANCEL_CUTOFF_MINUTES
        );
    }
}
