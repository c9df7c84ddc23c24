use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timeframe for percentage-change queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1-minute window
    #[serde(rename = "1m")]
    Minute1,
    /// 5-minute window
    #[serde(rename = "5m")]
    Minute5,
    /// 15-minute window
    #[serde(rename = "15m")]
    Minute15,
    /// 30-minute window
    #[serde(rename = "30m")]
    Minute30,
    /// 1-hour window
    #[serde(rename = "1h")]
    Hour1,
    /// 4-hour window
    #[serde(rename = "4h")]
    Hour4,
    /// 24-hour window
    #[serde(rename = "24h")]
    Hour24,
}

impl Timeframe {
    /// Window length used to locate the reference snapshot
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::Minute1 => Duration::minutes(1),
            Timeframe::Minute5 => Duration::minutes(5),
            Timeframe::Minute15 => Duration::minutes(15),
            Timeframe::Minute30 => Duration::minutes(30),
            Timeframe::Hour1 => Duration::hours(1),
            Timeframe::Hour4 => Duration::hours(4),
            Timeframe::Hour24 => Duration::hours(24),
        }
    }

    /// Convert to the token used in query parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Hour24 => "24h",
        }
    }

    /// Parse from a query-parameter token
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "1m" => Ok(Timeframe::Minute1),
            "5m" => Ok(Timeframe::Minute5),
            "15m" => Ok(Timeframe::Minute15),
            "30m" => Ok(Timeframe::Minute30),
            "1h" => Ok(Timeframe::Hour1),
            "4h" => Ok(Timeframe::Hour4),
            "24h" => Ok(Timeframe::Hour24),
            _ => Err(format!(
                "Invalid timeframe: '{}'. Valid values: 1m, 5m, 15m, 30m, 1h, 4h, 24h",
                s
            )),
        }
    }

    /// Get all supported timeframes
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::Minute1,
            Timeframe::Minute5,
            Timeframe::Minute15,
            Timeframe::Minute30,
            Timeframe::Hour1,
            Timeframe::Hour4,
            Timeframe::Hour24,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::Minute15
    }
}
