//! Timeframe resolution: nearest-preceding-snapshot lookup and percentage
//! deltas, with the native-24h fallback policy.

use chrono::{DateTime, Utc};

use super::{HighLowTracker, PriceEngine, SnapshotHistory};
use crate::constants::{MIN_PAIR_PRICE, MIN_PAIR_VOLUME, NEAR_EXTREME_RATIO};
use crate::exchanges::ExchangeAdapter;
use crate::models::{ExchangeId, Snapshot, Timeframe, TimeframeResult};
use crate::utils::round3;

impl PriceEngine {
    /// Resolve the requested timeframe for every qualifying pair of one
    /// exchange. Empty until the first successful poll. No ordering
    /// guarantee; callers sort as needed.
    pub async fn timeframe_data(
        &self,
        exchange: ExchangeId,
        timeframe: Timeframe,
        market: &str,
    ) -> Vec<TimeframeResult> {
        self.timeframe_data_at(exchange, timeframe, market, Utc::now())
            .await
    }

    pub async fn timeframe_data_at(
        &self,
        exchange: ExchangeId,
        timeframe: Timeframe,
        market: &str,
        now: DateTime<Utc>,
    ) -> Vec<TimeframeResult> {
        let Some(state) = self.state(exchange) else {
            return Vec::new();
        };

        let snapshots = state.snapshots.read().await;
        if snapshots.is_empty() {
            return Vec::new();
        }
        let high_low = state.high_low.read().await;

        resolve(
            &snapshots,
            &high_low,
            state.adapter.as_ref(),
            timeframe,
            market,
            now,
        )
    }
}

/// Find the reference snapshot for a target time: the predecessor of the
/// first snapshot at or after the target. References that are the oldest
/// retained snapshot are rejected (the store is still warming up) and the
/// caller falls back to native 24h figures.
fn usable_reference(
    history: &SnapshotHistory,
    target: DateTime<Utc>,
) -> Option<&Snapshot> {
    let first_at_or_after = history.iter().position(|s| s.ts >= target)?;
    if first_at_or_after < 2 {
        return None;
    }
    history.get(first_at_or_after - 1)
}

fn resolve(
    history: &SnapshotHistory,
    tracker: &HighLowTracker,
    adapter: &dyn ExchangeAdapter,
    timeframe: Timeframe,
    market: &str,
    now: DateTime<Utc>,
) -> Vec<TimeframeResult> {
    let Some(latest) = history.newest() else {
        return Vec::new();
    };

    let target = now - timeframe.duration();
    let reference = usable_reference(history, target);

    let mut results = Vec::new();
    for (symbol, current) in &latest.tickers {
        if !symbol.ends_with(market) {
            continue;
        }
        if current.volume < MIN_PAIR_VOLUME && current.price < MIN_PAIR_PRICE {
            continue;
        }

        let past = reference
            .and_then(|r| r.tickers.get(symbol))
            .filter(|p| p.price > 0.0);

        let (price_change, vol_change) =
            if timeframe == Timeframe::Hour24 && current.change24h != 0.0 {
                // Native figures include sub-interval history from before
                // process start, so they win for the 24h timeframe.
                (current.change24h, current.vol_change24h.unwrap_or(0.0))
            } else if let Some(past) = past {
                let price_change = (current.price - past.price) / past.price * 100.0;
                let vol_change = if past.volume > 0.0 {
                    (current.volume - past.volume) / past.volume * 100.0
                } else {
                    0.0
                };
                (price_change, vol_change)
            } else {
                // Insufficient history, or the symbol was not yet listed in
                // the reference snapshot
                (current.change24h, current.vol_change24h.unwrap_or(0.0))
            };

        let mut high = current.high;
        let mut low = current.low;
        if let Some(entry) = tracker.get(symbol) {
            if high == 0.0 {
                high = entry.high;
            }
            if low == 0.0 {
                low = entry.low;
            }
        }

        results.push(TimeframeResult {
            symbol: symbol.clone(),
            display_symbol: adapter.display_symbol(symbol, market),
            price: current.price,
            price_change: round3(price_change),
            change24h: current.change24h,
            vol_change: round3(vol_change),
            volume: current.volume,
            high,
            low,
            near_high: high > 0.0 && (high - current.price) / high < NEAR_EXTREME_RATIO,
            near_low: low > 0.0 && (current.price - low) / low < NEAR_EXTREME_RATIO,
            exchange: adapter.id(),
            categories: None,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::super::test_support::stub_engine;
    use super::*;
    use crate::models::{TickerMap, TickerRecord};
    use chrono::{Duration, TimeZone};

    fn record(price: f64, volume: f64, change24h: f64) -> TickerRecord {
        TickerRecord {
            price,
            volume,
            high: 0.0,
            low: 0.0,
            open: price,
            change24h,
            vol_change24h: Some(change24h / 2.0),
        }
    }

    fn one_symbol(symbol: &str, record: TickerRecord) -> TickerMap {
        let mut map = TickerMap::new();
        map.insert(symbol.to_string(), record);
        map
    }

    #[tokio::test]
    async fn test_single_snapshot_falls_back_to_native_figures() {
        let engine = stub_engine();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        engine
            .apply_snapshot_at(
                ExchangeId::Mexc,
                one_symbol("BTCUSDT", record(50000.0, 1000.0, 4.2)),
                now,
            )
            .await;

        for timeframe in Timeframe::all() {
            let results = engine
                .timeframe_data_at(ExchangeId::Mexc, timeframe, "USDT", now)
                .await;
            assert_eq!(results.len(), 1, "timeframe {}", timeframe);
            assert_eq!(results[0].price_change, 4.2);
            assert_eq!(results[0].vol_change, 2.1);
        }
    }

    #[tokio::test]
    async fn test_snapshot_delta_uses_nearest_preceding_reference() {
        let engine = stub_engine();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        // Three snapshots: 120s, 70s, and 5s before the query
        for (secs_ago, price, volume) in [(120, 100.0, 1000.0), (70, 110.0, 2000.0), (5, 121.0, 3000.0)] {
            engine
                .apply_snapshot_at(
                    ExchangeId::Kraken,
                    one_symbol("BTCUSD", record(price, volume, 9.9)),
                    start + Duration::seconds(300 - secs_ago),
                )
                .await;
        }

        let now = start + Duration::seconds(300);
        let results = engine
            .timeframe_data_at(ExchangeId::Kraken, Timeframe::Minute1, "USD", now)
            .await;

        // Reference is the 70s-old snapshot, the one just before target
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].price_change, 10.0);
        assert_eq!(results[0].vol_change, 50.0);
        // Native 24h change still reported verbatim alongside
        assert_eq!(results[0].change24h, 9.9);
    }

    #[tokio::test]
    async fn test_symbol_missing_from_reference_falls_back() {
        let engine = stub_engine();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        engine
            .apply_snapshot_at(
                ExchangeId::Kraken,
                one_symbol("ETHUSD", record(10.0, 500.0, 1.0)),
                start,
            )
            .await;
        engine
            .apply_snapshot_at(
                ExchangeId::Kraken,
                one_symbol("ETHUSD", record(10.0, 500.0, 1.0)),
                start + Duration::seconds(10),
            )
            .await;
        // BTCUSD only appears in the latest snapshot
        let mut latest = one_symbol("ETHUSD", record(10.0, 500.0, 1.0));
        latest.insert("BTCUSD".to_string(), record(100.0, 9000.0, 7.5));
        engine
            .apply_snapshot_at(ExchangeId::Kraken, latest, start + Duration::seconds(120))
            .await;

        let now = start + Duration::seconds(125);
        let mut results = engine
            .timeframe_data_at(ExchangeId::Kraken, Timeframe::Minute1, "USD", now)
            .await;
        results.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let btc = &results[0];
        assert_eq!(btc.symbol, "BTCUSD");
        assert_eq!(btc.price_change, 7.5);
        let eth = &results[1];
        assert_eq!(eth.price_change, 0.0);
    }

    #[tokio::test]
    async fn test_market_and_dust_filters() {
        let engine = stub_engine();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        let mut tickers = TickerMap::new();
        tickers.insert("BTCUSD".to_string(), record(50000.0, 1000.0, 1.0));
        tickers.insert("BTCUSDT".to_string(), record(50000.0, 1000.0, 1.0));
        // dust: fails both the volume and price thresholds
        tickers.insert("DUSTUSD".to_string(), record(0.00001, 5.0, 1.0));
        // low volume but real price: kept
        tickers.insert("RAREUSD".to_string(), record(3.0, 50.0, 1.0));
        engine.apply_snapshot_at(ExchangeId::Coinbase, tickers, now).await;

        let mut results = engine
            .timeframe_data_at(ExchangeId::Coinbase, Timeframe::Hour1, "USD", now)
            .await;
        results.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSD", "RAREUSD"]);
        assert_eq!(results[0].display_symbol, "BTC/USD");
    }

    #[tokio::test]
    async fn test_high_low_falls_back_to_tracker_when_native_is_zero() {
        let engine = stub_engine();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        // Native high/low stay 0 (Coinbase-style); tracker sees 100 and 90
        engine
            .apply_snapshot_at(
                ExchangeId::Coinbase,
                one_symbol("BTCUSD", record(100.0, 1000.0, 1.0)),
                start,
            )
            .await;
        engine
            .apply_snapshot_at(
                ExchangeId::Coinbase,
                one_symbol("BTCUSD", record(90.0, 1000.0, 1.0)),
                start + Duration::seconds(10),
            )
            .await;

        let results = engine
            .timeframe_data_at(
                ExchangeId::Coinbase,
                Timeframe::Minute5,
                "USD",
                start + Duration::seconds(20),
            )
            .await;

        assert_eq!(results[0].high, 100.0);
        assert_eq!(results[0].low, 90.0);
        // price 90 sits on the reconstructed low
        assert!(results[0].near_low);
        assert!(!results[0].near_high);
    }

    #[tokio::test]
    async fn test_native_high_low_preferred_when_present() {
        let engine = stub_engine();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        let mut ticker = record(99.9, 1000.0, 1.0);
        ticker.high = 100.0;
        ticker.low = 80.0;
        engine
            .apply_snapshot_at(ExchangeId::Mexc, one_symbol("BTCUSDT", ticker), now)
            .await;

        let results = engine
            .timeframe_data_at(ExchangeId::Mexc, Timeframe::Hour1, "USDT", now)
            .await;
        assert_eq!(results[0].high, 100.0);
        assert_eq!(results[0].low, 80.0);
        assert!(results[0].near_high);
        assert!(!results[0].near_low);
    }

    #[tokio::test]
    async fn test_repeated_query_is_idempotent() {
        let engine = stub_engine();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        for i in 0..5 {
            engine
                .apply_snapshot_at(
                    ExchangeId::Kucoin,
                    one_symbol("BTCUSDT", record(100.0 + i as f64, 1000.0, 2.0)),
                    start + Duration::seconds(i * 10),
                )
                .await;
        }

        let now = start + Duration::seconds(60);
        let mut first = engine
            .timeframe_data_at(ExchangeId::Kucoin, Timeframe::Minute1, "USDT", now)
            .await;
        let mut second = engine
            .timeframe_data_at(ExchangeId::Kucoin, Timeframe::Minute1, "USDT", now)
            .await;
        first.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        second.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_exchange_state_is_empty() {
        let engine = stub_engine();
        let results = engine
            .timeframe_data(ExchangeId::Kraken, Timeframe::Minute15, "USD")
            .await;
        assert!(results.is_empty());
    }
}
