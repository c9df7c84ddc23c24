//! Cross-exchange aggregation: one deduplicated view over every exchange's
//! resolver output.

use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::PriceEngine;
use crate::models::{AggregatedResult, Timeframe, TimeframeResult};

impl PriceEngine {
    /// Resolve the timeframe on every exchange and merge by symbol
    pub async fn all_exchanges_data(
        &self,
        timeframe: Timeframe,
        market: &str,
    ) -> Vec<AggregatedResult> {
        self.all_exchanges_data_at(timeframe, market, Utc::now())
            .await
    }

    pub async fn all_exchanges_data_at(
        &self,
        timeframe: Timeframe,
        market: &str,
        now: DateTime<Utc>,
    ) -> Vec<AggregatedResult> {
        let mut all = Vec::new();
        for id in self.exchange_ids() {
            all.extend(self.timeframe_data_at(id, timeframe, market, now).await);
        }
        merge_by_symbol(all)
    }
}

/// Streaming merge: volumes accumulate per symbol, and an item whose own
/// volume exceeds the pre-addition running total takes over every
/// non-volume field. The final winner is the globally largest
/// single-exchange contributor regardless of iteration order.
fn merge_by_symbol(items: Vec<TimeframeResult>) -> Vec<AggregatedResult> {
    let mut merged: HashMap<String, AggregatedResult> = HashMap::new();

    for item in items {
        match merged.entry(item.symbol.clone()) {
            Entry::Vacant(slot) => {
                let exchanges = vec![item.exchange];
                slot.insert(AggregatedResult {
                    result: item,
                    exchanges,
                });
            }
            Entry::Occupied(mut slot) => {
                let aggregated = slot.get_mut();
                let running_total = aggregated.result.volume;
                aggregated.exchanges.push(item.exchange);

                if item.volume > running_total {
                    aggregated.result = TimeframeResult {
                        volume: running_total + item.volume,
                        ..item
                    };
                } else {
                    aggregated.result.volume = running_total + item.volume;
                }
            }
        }
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::stub_engine;
    use super::*;
    use crate::models::{ExchangeId, TickerMap, TickerRecord};
    use chrono::TimeZone;

    fn result(exchange: ExchangeId, symbol: &str, price: f64, volume: f64) -> TimeframeResult {
        TimeframeResult {
            symbol: symbol.to_string(),
            display_symbol: format!("{}/USDT", symbol.trim_end_matches("USDT")),
            price,
            price_change: price / 100.0,
            change24h: price / 200.0,
            vol_change: 0.0,
            volume,
            high: price * 1.1,
            low: price * 0.9,
            near_high: false,
            near_low: false,
            exchange,
            categories: None,
        }
    }

    #[test]
    fn test_merge_sums_volume_and_keeps_largest_contributor() {
        let merged = merge_by_symbol(vec![
            result(ExchangeId::Coinbase, "BTCUSDT", 50000.0, 100.0),
            result(ExchangeId::Mexc, "BTCUSDT", 50100.0, 900.0),
        ]);

        assert_eq!(merged.len(), 1);
        let btc = &merged[0];
        assert_eq!(btc.result.volume, 1000.0);
        // every non-volume field comes from the 900-volume exchange
        assert_eq!(btc.result.price, 50100.0);
        assert_eq!(btc.result.exchange, ExchangeId::Mexc);
        assert_eq!(
            btc.exchanges,
            vec![ExchangeId::Coinbase, ExchangeId::Mexc]
        );
    }

    #[test]
    fn test_merge_winner_is_order_independent() {
        let items = [
            result(ExchangeId::Coinbase, "BTCUSDT", 1.0, 100.0),
            result(ExchangeId::Mexc, "BTCUSDT", 2.0, 900.0),
            result(ExchangeId::Kucoin, "BTCUSDT", 3.0, 500.0),
        ];

        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        for order in orders {
            let permuted: Vec<TimeframeResult> =
                order.iter().map(|i| items[*i].clone()).collect();
            let merged = merge_by_symbol(permuted);

            assert_eq!(merged.len(), 1, "order {:?}", order);
            let btc = &merged[0];
            assert_eq!(btc.result.volume, 1500.0, "order {:?}", order);
            assert_eq!(btc.result.exchange, ExchangeId::Mexc, "order {:?}", order);
            assert_eq!(btc.result.price, 2.0, "order {:?}", order);
            assert_eq!(btc.exchanges.len(), 3, "order {:?}", order);
        }
    }

    #[test]
    fn test_distinct_symbols_stay_separate() {
        let merged = merge_by_symbol(vec![
            result(ExchangeId::Coinbase, "BTCUSDT", 1.0, 100.0),
            result(ExchangeId::Mexc, "ETHUSDT", 2.0, 200.0),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn test_engine_level_aggregation() {
        let engine = stub_engine();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        let mut coinbase = TickerMap::new();
        coinbase.insert(
            "BTCUSDT".to_string(),
            TickerRecord {
                price: 50000.0,
                volume: 100.0,
                high: 0.0,
                low: 0.0,
                open: 50000.0,
                change24h: 1.0,
                vol_change24h: None,
            },
        );
        let mut mexc = TickerMap::new();
        mexc.insert(
            "BTCUSDT".to_string(),
            TickerRecord {
                price: 50100.0,
                volume: 900.0,
                high: 51000.0,
                low: 49000.0,
                open: 50000.0,
                change24h: 2.0,
                vol_change24h: None,
            },
        );
        engine.apply_snapshot_at(ExchangeId::Coinbase, coinbase, now).await;
        engine.apply_snapshot_at(ExchangeId::Mexc, mexc, now).await;

        let merged = engine
            .all_exchanges_data_at(Timeframe::Hour24, "USDT", now)
            .await;

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].result.volume, 1000.0);
        assert_eq!(merged[0].result.price, 50100.0);
        assert_eq!(merged[0].result.change24h, 2.0);
        assert_eq!(merged[0].result.exchange, ExchangeId::Mexc);
    }
}
