//! Multi-exchange price engine.
//!
//! One [`ExchangeState`] per exchange, each with its own snapshot history
//! and high/low tracker behind independent locks. The polling task is the
//! only writer for its exchange; queries take short read locks and never
//! touch other exchanges' state.

mod aggregator;
mod high_low;
mod resolver;
mod sparkline;
mod store;

pub use high_low::{HighLowEntry, HighLowTracker};
pub use store::SnapshotHistory;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::exchanges::ExchangeAdapter;
use crate::models::{
    ExchangeId, ExchangeInfo, ExchangeSelect, HistoryInfo, Snapshot, TickerMap,
};

pub type SharedEngine = Arc<PriceEngine>;

struct ExchangeState {
    adapter: Box<dyn ExchangeAdapter>,
    snapshots: RwLock<SnapshotHistory>,
    high_low: RwLock<HighLowTracker>,
    pair_count: AtomicUsize,
    fetch_errors: AtomicU64,
}

impl ExchangeState {
    fn new(adapter: Box<dyn ExchangeAdapter>) -> Self {
        Self {
            adapter,
            snapshots: RwLock::new(SnapshotHistory::new()),
            high_low: RwLock::new(HighLowTracker::new()),
            pair_count: AtomicUsize::new(0),
            fetch_errors: AtomicU64::new(0),
        }
    }
}

/// Engine owning every exchange's polling state, constructed once at startup
/// and shared as [`SharedEngine`] with the scheduler and the query layer.
pub struct PriceEngine {
    exchanges: Vec<ExchangeState>,
}

impl PriceEngine {
    pub fn new(adapters: Vec<Box<dyn ExchangeAdapter>>) -> Self {
        Self {
            exchanges: adapters.into_iter().map(ExchangeState::new).collect(),
        }
    }

    /// Exchange ids in registration order
    pub fn exchange_ids(&self) -> Vec<ExchangeId> {
        self.exchanges.iter().map(|s| s.adapter.id()).collect()
    }

    fn state(&self, id: ExchangeId) -> Option<&ExchangeState> {
        self.exchanges.iter().find(|s| s.adapter.id() == id)
    }

    /// Run one poll cycle for an exchange: fetch, then apply on success or
    /// bump the consecutive-error counter on failure. Returns the number of
    /// pairs fetched (0 means "no update this cycle").
    pub async fn poll_once(&self, id: ExchangeId) -> Result<usize> {
        let state = self
            .state(id)
            .ok_or_else(|| AppError::NotFound(format!("exchange {}", id)))?;

        match state.adapter.fetch_ticker().await {
            Ok(tickers) => {
                let count = tickers.len();
                if count > 0 {
                    self.apply_snapshot(id, tickers).await;
                }
                Ok(count)
            }
            Err(e) => {
                state.fetch_errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Consecutive failed poll cycles for an exchange
    pub fn error_count(&self, id: ExchangeId) -> u64 {
        self.state(id)
            .map_or(0, |s| s.fetch_errors.load(Ordering::Relaxed))
    }

    /// Record a successful poll, timestamped now
    pub async fn apply_snapshot(&self, id: ExchangeId, tickers: TickerMap) {
        self.apply_snapshot_at(id, tickers, Utc::now()).await;
    }

    /// Record a successful poll with an explicit timestamp.
    ///
    /// An empty map leaves all state untouched, including the error counter.
    pub async fn apply_snapshot_at(
        &self,
        id: ExchangeId,
        tickers: TickerMap,
        ts: DateTime<Utc>,
    ) {
        let Some(state) = self.state(id) else {
            return;
        };
        if tickers.is_empty() {
            return;
        }

        state.pair_count.store(tickers.len(), Ordering::Relaxed);
        state.fetch_errors.store(0, Ordering::Relaxed);

        {
            let mut high_low = state.high_low.write().await;
            high_low.observe(&tickers, ts);
        }
        {
            let mut snapshots = state.snapshots.write().await;
            snapshots.append(Snapshot::new(ts, tickers));
        }
    }

    /// Freshness/coverage statistics for one exchange or all combined
    pub async fn history_info(&self, select: ExchangeSelect) -> HistoryInfo {
        self.history_info_at(select, Utc::now()).await
    }

    pub async fn history_info_at(
        &self,
        select: ExchangeSelect,
        now: DateTime<Utc>,
    ) -> HistoryInfo {
        match select {
            ExchangeSelect::One(id) => match self.state(id) {
                Some(state) => self.exchange_history(state, now).await,
                None => HistoryInfo::default(),
            },
            ExchangeSelect::All => {
                let mut combined = HistoryInfo::default();
                let mut newest_age: Option<i64> = None;

                for state in &self.exchanges {
                    let info = self.exchange_history(state, now).await;
                    if info.snapshots == 0 {
                        continue;
                    }
                    combined.snapshots += info.snapshots;
                    combined.pairs += info.pairs;
                    combined.oldest_age = combined.oldest_age.max(info.oldest_age);
                    newest_age = Some(match newest_age {
                        Some(current) => current.min(info.newest_age),
                        None => info.newest_age,
                    });
                }

                combined.newest_age = newest_age.unwrap_or(0);
                combined
            }
        }
    }

    async fn exchange_history(&self, state: &ExchangeState, now: DateTime<Utc>) -> HistoryInfo {
        let snapshots = state.snapshots.read().await;
        match (snapshots.oldest(), snapshots.newest()) {
            (Some(oldest), Some(newest)) => HistoryInfo {
                snapshots: snapshots.len(),
                oldest_age: (now - oldest.ts).num_seconds(),
                newest_age: (now - newest.ts).num_seconds(),
                pairs: state.pair_count.load(Ordering::Relaxed),
            },
            _ => HistoryInfo::default(),
        }
    }

    /// Exchange listing with live pair counts and error counters
    pub fn exchanges(&self) -> Vec<ExchangeInfo> {
        self.exchanges
            .iter()
            .map(|state| ExchangeInfo {
                id: state.adapter.id(),
                name: state.adapter.display_name(),
                markets: state.adapter.markets().to_vec(),
                pairs: state.pair_count.load(Ordering::Relaxed),
                errors: state.fetch_errors.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// History Reporter output for every exchange, keyed by id
    pub async fn history_info_all_exchanges(&self) -> BTreeMap<String, HistoryInfo> {
        let now = Utc::now();
        let mut all = BTreeMap::new();
        for state in &self.exchanges {
            let info = self.exchange_history(state, now).await;
            all.insert(state.adapter.id().to_string(), info);
        }
        all
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;

    use super::*;
    use crate::models::TickerRecord;

    pub struct StubAdapter {
        id: ExchangeId,
    }

    #[async_trait]
    impl ExchangeAdapter for StubAdapter {
        fn id(&self) -> ExchangeId {
            self.id
        }
        fn display_name(&self) -> &'static str {
            "Stub"
        }
        fn markets(&self) -> &'static [&'static str] {
            &["USD", "USDT"]
        }
        async fn fetch_ticker(&self) -> Result<TickerMap> {
            Ok(TickerMap::new())
        }
    }

    /// Engine with a stub adapter per exchange; tests feed it snapshots
    /// through `apply_snapshot_at`.
    pub fn stub_engine() -> PriceEngine {
        PriceEngine::new(
            ExchangeId::ALL
                .iter()
                .map(|id| Box::new(StubAdapter { id: *id }) as Box<dyn ExchangeAdapter>)
                .collect(),
        )
    }

    pub fn record(price: f64, volume: f64) -> TickerRecord {
        TickerRecord {
            price,
            volume,
            high: 0.0,
            low: 0.0,
            open: price,
            change24h: 0.0,
            vol_change24h: None,
        }
    }

    pub fn tickers(entries: &[(&str, f64, f64)]) -> TickerMap {
        entries
            .iter()
            .map(|(symbol, price, volume)| (symbol.to_string(), record(*price, *volume)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{stub_engine, tickers};
    use super::*;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_empty_map_is_a_noop_cycle() {
        let engine = stub_engine();
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        engine
            .apply_snapshot_at(ExchangeId::Mexc, TickerMap::new(), ts)
            .await;

        let info = engine
            .history_info_at(ExchangeSelect::One(ExchangeId::Mexc), ts)
            .await;
        assert_eq!(info, HistoryInfo::default());
    }

    #[tokio::test]
    async fn test_history_info_single_exchange() {
        let engine = stub_engine();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        engine
            .apply_snapshot_at(ExchangeId::Kraken, tickers(&[("BTCUSD", 100.0, 5000.0)]), start)
            .await;
        engine
            .apply_snapshot_at(
                ExchangeId::Kraken,
                tickers(&[("BTCUSD", 101.0, 5100.0), ("ETHUSD", 10.0, 900.0)]),
                start + Duration::seconds(10),
            )
            .await;

        let now = start + Duration::seconds(70);
        let info = engine
            .history_info_at(ExchangeSelect::One(ExchangeId::Kraken), now)
            .await;
        assert_eq!(info.snapshots, 2);
        assert_eq!(info.oldest_age, 70);
        assert_eq!(info.newest_age, 60);
        assert_eq!(info.pairs, 2);
    }

    #[tokio::test]
    async fn test_history_info_all_takes_conservative_bounds() {
        let engine = stub_engine();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        engine
            .apply_snapshot_at(ExchangeId::Coinbase, tickers(&[("BTCUSD", 1.0, 500.0)]), start)
            .await;
        engine
            .apply_snapshot_at(
                ExchangeId::Kucoin,
                tickers(&[("BTCUSDT", 1.0, 500.0)]),
                start + Duration::seconds(30),
            )
            .await;

        let now = start + Duration::seconds(100);
        let info = engine.history_info_at(ExchangeSelect::All, now).await;
        assert_eq!(info.snapshots, 2);
        assert_eq!(info.pairs, 2);
        // most stale bounds: max oldest, min newest
        assert_eq!(info.oldest_age, 100);
        assert_eq!(info.newest_age, 70);
    }

    #[tokio::test]
    async fn test_history_info_empty_engine_is_zero() {
        let engine = stub_engine();
        let info = engine.history_info(ExchangeSelect::All).await;
        assert_eq!(info, HistoryInfo::default());
    }
}
