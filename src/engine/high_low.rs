use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

use crate::constants::HIGH_LOW_WINDOW_SECS;
use crate::models::TickerMap;

/// Rolling 24h extremum reconstruction for one symbol.
///
/// Invariant: `high`/`low` are the max/min price over exactly the retained
/// points, recomputed after every prune+append.
#[derive(Debug)]
pub struct HighLowEntry {
    pub high: f64,
    pub low: f64,
    points: VecDeque<(DateTime<Utc>, f64)>,
}

impl HighLowEntry {
    fn new() -> Self {
        Self {
            high: 0.0,
            low: 0.0,
            points: VecDeque::new(),
        }
    }

    fn observe(&mut self, ts: DateTime<Utc>, price: f64) {
        let cutoff = ts - Duration::seconds(HIGH_LOW_WINDOW_SECS);
        self.points.push_back((ts, price));

        while self
            .points
            .front()
            .map_or(false, |(point_ts, _)| *point_ts < cutoff)
        {
            self.points.pop_front();
        }

        let mut high = f64::NEG_INFINITY;
        let mut low = f64::INFINITY;
        for (_, price) in &self.points {
            if *price > high {
                high = *price;
            }
            if *price < low {
                low = *price;
            }
        }
        self.high = high;
        self.low = low;
    }

    #[cfg(test)]
    fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// Per-symbol running high/low for one exchange.
///
/// Compensates for adapters that report high/low as 0; the resolver consults
/// it only in that case.
#[derive(Debug, Default)]
pub struct HighLowTracker {
    entries: HashMap<String, HighLowEntry>,
}

impl HighLowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the prices of one successful poll
    pub fn observe(&mut self, tickers: &TickerMap, ts: DateTime<Utc>) {
        for (symbol, record) in tickers {
            self.entries
                .entry(symbol.clone())
                .or_insert_with(HighLowEntry::new)
                .observe(ts, record.price);
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&HighLowEntry> {
        self.entries.get(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TickerRecord;
    use chrono::TimeZone;

    fn ticker(price: f64) -> TickerMap {
        let mut map = TickerMap::new();
        map.insert(
            "BTCUSD".to_string(),
            TickerRecord {
                price,
                volume: 1000.0,
                high: 0.0,
                low: 0.0,
                open: price,
                change24h: 0.0,
                vol_change24h: None,
            },
        );
        map
    }

    #[test]
    fn test_extrema_track_retained_points_exactly() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut tracker = HighLowTracker::new();

        tracker.observe(&ticker(100.0), start);
        tracker.observe(&ticker(150.0), start + Duration::hours(1));
        tracker.observe(&ticker(80.0), start + Duration::hours(2));

        let entry = tracker.get("BTCUSD").unwrap();
        assert_eq!(entry.high, 150.0);
        assert_eq!(entry.low, 80.0);
        assert_eq!(entry.point_count(), 3);
    }

    #[test]
    fn test_stale_points_fall_out_of_window() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut tracker = HighLowTracker::new();

        // The 200.0 high ages out once observations move past 24h
        tracker.observe(&ticker(200.0), start);
        tracker.observe(&ticker(90.0), start + Duration::hours(12));
        tracker.observe(&ticker(110.0), start + Duration::hours(25));

        let entry = tracker.get("BTCUSD").unwrap();
        assert_eq!(entry.point_count(), 2);
        assert_eq!(entry.high, 110.0);
        assert_eq!(entry.low, 90.0);
    }

    #[test]
    fn test_unknown_symbol_is_none() {
        let tracker = HighLowTracker::new();
        assert!(tracker.get("ETHUSD").is_none());
    }
}
