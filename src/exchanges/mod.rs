//! Exchange adapters.
//!
//! Each adapter translates one exchange's REST ticker payload into the
//! normalized [`TickerMap`]. New exchanges are added as new variants of this
//! closed set; shared logic never branches on exchange name.

mod coinbase;
mod kraken;
mod kucoin;
mod mexc;

pub use coinbase::CoinbaseAdapter;
pub use kraken::KrakenAdapter;
pub use kucoin::KucoinAdapter;
pub use mexc::MexcAdapter;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{ExchangeId, TickerMap};

/// Capability interface shared by all exchange variants.
///
/// A fetch failure is reported to the caller and counted there; it never
/// crosses the adapter boundary as anything other than an `Err`. An empty
/// map is a valid "no update this cycle" result.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn id(&self) -> ExchangeId;

    fn display_name(&self) -> &'static str;

    /// Quote currencies this exchange supports, in display order
    fn markets(&self) -> &'static [&'static str];

    /// Fetch the current ticker for every listed pair
    async fn fetch_ticker(&self) -> Result<TickerMap>;

    /// Format a native symbol as "BASE/QUOTE" for the given market
    fn display_symbol(&self, symbol: &str, market: &str) -> String {
        let base = symbol.strip_suffix(market).unwrap_or(symbol);
        format!("{}/{}", base, market)
    }
}

/// Construct one adapter per supported exchange, sharing one HTTP client
pub fn build_adapters(client: &reqwest::Client) -> Vec<Box<dyn ExchangeAdapter>> {
    vec![
        Box::new(CoinbaseAdapter::new(client.clone())),
        Box::new(KrakenAdapter::new(client.clone())),
        Box::new(MexcAdapter::new(client.clone())),
        Box::new(KucoinAdapter::new(client.clone())),
    ]
}

/// Construct the adapter for a single exchange
pub fn build_adapter(id: ExchangeId, client: &reqwest::Client) -> Box<dyn ExchangeAdapter> {
    match id {
        ExchangeId::Coinbase => Box::new(CoinbaseAdapter::new(client.clone())),
        ExchangeId::Kraken => Box::new(KrakenAdapter::new(client.clone())),
        ExchangeId::Mexc => Box::new(MexcAdapter::new(client.clone())),
        ExchangeId::Kucoin => Box::new(KucoinAdapter::new(client.clone())),
    }
}

/// GET a JSON document, failing on non-2xx status before attempting to decode
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Network(format!(
            "{} returned HTTP {}",
            url, status
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AppError::Parse(format!("{}: {}", url, e)))
}
