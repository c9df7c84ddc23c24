use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::engine::SharedEngine;
use crate::models::ExchangeId;

/// Spawn one polling task per registered exchange.
///
/// Each task is the single writer for its exchange's state; a slow or hung
/// fetch delays only that exchange's next cycle.
pub fn spawn_pollers(engine: &SharedEngine, interval: Duration) {
    for exchange in engine.exchange_ids() {
        let engine = engine.clone();
        tokio::spawn(async move {
            run(engine, exchange, interval).await;
        });
    }
}

/// Poll one exchange forever: fetch, apply on success, count and log on
/// failure. The fixed interval is the only retry mechanism.
pub async fn run(engine: SharedEngine, exchange: ExchangeId, interval: Duration) {
    info!(
        exchange = %exchange,
        interval_secs = interval.as_secs(),
        "Poller started"
    );

    loop {
        match engine.poll_once(exchange).await {
            Ok(0) => {
                debug!(exchange = %exchange, "Empty ticker result, no update this cycle");
            }
            Ok(pairs) => {
                debug!(exchange = %exchange, pairs, "Snapshot recorded");
            }
            Err(e) => {
                warn!(
                    exchange = %exchange,
                    consecutive_errors = engine.error_count(exchange),
                    error = %e,
                    "Fetch failed, skipping cycle"
                );
            }
        }

        sleep(interval).await;
    }
}
