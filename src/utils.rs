use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_POLL_INTERVAL_SECS;

/// Get the exchange poll interval from environment variable or use default
pub fn get_poll_interval() -> Duration {
    let secs = std::env::var("POLL_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    Duration::from_secs(secs)
}

/// Get the category cache file path from environment variable or use default
pub fn get_categories_cache_path() -> PathBuf {
    std::env::var("CATEGORIES_CACHE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data").join("categories-cache.json"))
}

/// Parse an optional string-encoded number, treating absent/bad values as 0.
///
/// Exchange payloads encode most numeric fields as JSON strings.
pub fn parse_f64(value: Option<&str>) -> f64 {
    value.and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0)
}

/// Round a percentage to 3 decimal places for API output
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(Some("1.5")), 1.5);
        assert_eq!(parse_f64(Some("-0.0743")), -0.0743);
        assert_eq!(parse_f64(Some("garbage")), 0.0);
        assert_eq!(parse_f64(Some("")), 0.0);
        assert_eq!(parse_f64(None), 0.0);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(-7.4299999), -7.43);
        assert_eq!(round3(0.0), 0.0);
    }
}
