//! Engine Tuning Constants
//!
//! Polling cadence, retention windows, and query thresholds for the
//! multi-exchange price engine.

/// Seconds between polls of each exchange's ticker endpoint.
///
/// Every exchange is polled on its own task, so a slow exchange only delays
/// its own next tick. Overridable via `POLL_INTERVAL_SECS`.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Maximum age of a retained snapshot (25 hours).
///
/// One hour beyond the longest timeframe so a 24h delta always has a
/// reference snapshot available.
pub const SNAPSHOT_MAX_AGE_SECS: i64 = 25 * 60 * 60;

/// Window for the running high/low reconstruction (24 hours).
///
/// Matches the native 24h high/low the other exchanges report.
pub const HIGH_LOW_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Pairs below BOTH thresholds are dropped from timeframe results as
/// dust/dead listings.
pub const MIN_PAIR_VOLUME: f64 = 100.0;
pub const MIN_PAIR_PRICE: f64 = 0.0001;

/// A price within this fraction of the 24h high/low is flagged
/// nearHigh/nearLow.
pub const NEAR_EXTREME_RATIO: f64 = 0.005;

/// Maximum number of points returned by the sparkline sampler.
pub const SPARKLINE_MAX_POINTS: usize = 30;

/// HTTP timeout for exchange ticker requests.
///
/// Kept well above the poll interval: a hung request delays that exchange's
/// next cycle rather than piling up concurrent fetches.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Page size for the Coinbase product listing (API maximum).
pub const COINBASE_PAGE_LIMIT: usize = 500;

/// How often the category index is refreshed (6 hours), and how often the
/// refresh condition is checked (30 minutes).
pub const CATEGORY_REFRESH_SECS: u64 = 6 * 60 * 60;
pub const CATEGORY_CHECK_SECS: u64 = 30 * 60;

/// Delay between CoinGecko category page fetches. The free tier allows
/// roughly 10-30 requests per minute; 6 seconds stays under it.
pub const CATEGORY_FETCH_PACE_SECS: u64 = 6;

/// Wait before retrying a CoinGecko request that returned HTTP 429.
pub const CATEGORY_RATE_LIMIT_BACKOFF_SECS: u64 = 60;
