use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized ticker for one pair, produced fresh on every poll.
///
/// `volume` is always quote-denominated 24h volume; adapters whose exchange
/// reports base volume convert it before returning. `high`/`low` of 0 mean
/// the exchange does not report them and the running tracker is consulted
/// instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub price: f64,
    pub volume: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    /// Native 24h price change, in percent
    pub change24h: f64,
    /// Native 24h volume change, in percent. Only some exchanges report it.
    pub vol_change24h: Option<f64>,
}

/// Ticker map keyed by exchange-native symbol
pub type TickerMap = HashMap<String, TickerRecord>;

/// One successful poll of one exchange
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub ts: DateTime<Utc>,
    pub tickers: TickerMap,
}

impl Snapshot {
    pub fn new(ts: DateTime<Utc>, tickers: TickerMap) -> Self {
        Self { ts, tickers }
    }
}
