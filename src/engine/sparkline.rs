//! Sparkline sampling: a bounded, evenly strided price trajectory for one
//! symbol, newest point always included.

use super::{PriceEngine, SnapshotHistory};
use crate::constants::SPARKLINE_MAX_POINTS;
use crate::models::{ExchangeId, ExchangeSelect, SparklinePoint};

impl PriceEngine {
    /// Down-sample one symbol's retained history to at most 30 points.
    ///
    /// `ExchangeSelect::All` picks whichever exchange has the symbol in the
    /// most snapshots. Empty when no exchange has any history for it.
    pub async fn sparkline_data(
        &self,
        select: ExchangeSelect,
        symbol: &str,
    ) -> Vec<SparklinePoint> {
        let id = match select {
            ExchangeSelect::One(id) => id,
            ExchangeSelect::All => match self.best_covered_exchange(symbol).await {
                Some(id) => id,
                None => return Vec::new(),
            },
        };

        let Some(state) = self.state(id) else {
            return Vec::new();
        };
        let snapshots = state.snapshots.read().await;
        sample_points(&snapshots, symbol)
    }

    /// The exchange whose history contains this symbol most often. The
    /// first exchange wins ties; none qualifies with zero coverage.
    async fn best_covered_exchange(&self, symbol: &str) -> Option<ExchangeId> {
        let mut best = None;
        let mut best_count = 0usize;

        for state in &self.exchanges {
            let snapshots = state.snapshots.read().await;
            let count = snapshots
                .iter()
                .filter(|s| s.tickers.contains_key(symbol))
                .count();
            if count > best_count {
                best_count = count;
                best = Some(state.adapter.id());
            }
        }

        best
    }
}

fn sample_points(history: &SnapshotHistory, symbol: &str) -> Vec<SparklinePoint> {
    if history.is_empty() {
        return Vec::new();
    }

    let stride = (history.len() / SPARKLINE_MAX_POINTS).max(1);
    let mut points: Vec<SparklinePoint> = history
        .iter()
        .step_by(stride)
        .filter_map(|snapshot| {
            snapshot.tickers.get(symbol).map(|t| SparklinePoint {
                ts: snapshot.ts.timestamp_millis(),
                price: t.price,
            })
        })
        .take(SPARKLINE_MAX_POINTS)
        .collect();

    // The newest point is always part of the trajectory, even when the
    // stride walks past it
    if let Some(newest) = history.newest() {
        if let Some(t) = newest.tickers.get(symbol) {
            let ts = newest.ts.timestamp_millis();
            if points.last().map_or(true, |p| p.ts != ts) {
                if points.len() == SPARKLINE_MAX_POINTS {
                    points.pop();
                }
                points.push(SparklinePoint { ts, price: t.price });
            }
        }
    }

    points
}
