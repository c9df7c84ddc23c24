use serde::Serialize;

use super::ExchangeId;

/// One pair's resolved timeframe data, as returned by the query API
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeResult {
    /// Exchange-native symbol, e.g. "BTCUSD"
    pub symbol: String,
    /// Display form, e.g. "BTC/USD"
    pub display_symbol: String,
    pub price: f64,
    /// Percent change over the requested timeframe, rounded to 3 decimals
    pub price_change: f64,
    /// Native 24h percent change as reported by the exchange
    pub change24h: f64,
    /// Percent volume change over the requested timeframe, rounded to 3 decimals
    pub vol_change: f64,
    /// Quote-denominated 24h volume
    pub volume: f64,
    pub high: f64,
    pub low: f64,
    /// Price within 0.5% of the 24h high
    pub near_high: bool,
    /// Price within 0.5% of the 24h low
    pub near_low: bool,
    pub exchange: ExchangeId,
    /// Category tags, attached by the HTTP layer once the index is ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

/// Cross-exchange merge of one symbol's TimeframeResults.
///
/// `volume` inside the flattened result is the sum across contributors;
/// every other field comes from the single largest-volume contributor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResult {
    #[serde(flatten)]
    pub result: TimeframeResult,
    /// Every exchange that reported this symbol
    #[serde(rename = "_exchanges")]
    pub exchanges: Vec<ExchangeId>,
}

/// One down-sampled point of a symbol's price trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SparklinePoint {
    /// Unix milliseconds
    pub ts: i64,
    pub price: f64,
}

/// Freshness/coverage statistics for one exchange (or all combined)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInfo {
    pub snapshots: usize,
    /// Age of the oldest retained snapshot, in seconds
    pub oldest_age: i64,
    /// Age of the newest retained snapshot, in seconds
    pub newest_age: i64,
    pub pairs: usize,
}

/// Exchange listing entry for the status API
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeInfo {
    pub id: ExchangeId,
    pub name: &'static str,
    pub markets: Vec<&'static str>,
    pub pairs: usize,
    /// Consecutive failed poll cycles
    pub errors: u64,
}
