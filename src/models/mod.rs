mod exchange_id;
mod results;
mod ticker;
mod timeframe;

pub use exchange_id::{ExchangeId, ExchangeSelect};
pub use results::{AggregatedResult, ExchangeInfo, HistoryInfo, SparklinePoint, TimeframeResult};
pub use ticker::{Snapshot, TickerMap, TickerRecord};
pub use timeframe::Timeframe;
