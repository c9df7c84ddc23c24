use async_trait::async_trait;
use serde::Deserialize;

use super::{get_json, ExchangeAdapter};
use crate::error::Result;
use crate::models::{ExchangeId, TickerMap, TickerRecord};
use crate::utils::parse_f64;

const TICKER_URL: &str = "https://api.mexc.com/api/v3/ticker/24hr";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MexcTicker {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    last_price: Option<String>,
    /// Already quote-denominated
    #[serde(default)]
    quote_volume: Option<String>,
    #[serde(default)]
    high_price: Option<String>,
    #[serde(default)]
    low_price: Option<String>,
    #[serde(default)]
    open_price: Option<String>,
    /// Fraction, not percent: -0.0743 means -7.43%
    #[serde(default)]
    price_change_percent: Option<String>,
}

pub struct MexcAdapter {
    client: reqwest::Client,
}

impl MexcAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExchangeAdapter for MexcAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::Mexc
    }

    fn display_name(&self) -> &'static str {
        "MEXC"
    }

    fn markets(&self) -> &'static [&'static str] {
        &["USDT", "USDC", "BTC", "ETH"]
    }

    async fn fetch_ticker(&self) -> Result<TickerMap> {
        let tickers: Vec<MexcTicker> = get_json(&self.client, TICKER_URL).await?;
        Ok(normalize_tickers(tickers))
    }
}

fn normalize_tickers(tickers: Vec<MexcTicker>) -> TickerMap {
    let mut prices = TickerMap::new();

    for t in tickers {
        let change24h = parse_f64(t.price_change_percent.as_deref()) * 100.0;

        prices.insert(
            t.symbol,
            TickerRecord {
                price: parse_f64(t.last_price.as_deref()),
                volume: parse_f64(t.quote_volume.as_deref()),
                high: parse_f64(t.high_price.as_deref()),
                low: parse_f64(t.low_price.as_deref()),
                open: parse_f64(t.open_price.as_deref()),
                change24h,
                vol_change24h: None,
            },
        );
    }

    prices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_fraction_scaled_to_percent() {
        let payload = r#"[
            {
                "symbol": "BTCUSDT",
                "lastPrice": "50000",
                "quoteVolume": "123456.5",
                "highPrice": "51000",
                "lowPrice": "48000",
                "openPrice": "49000",
                "priceChangePercent": "-0.0743"
            }
        ]"#;
        let tickers: Vec<MexcTicker> = serde_json::from_str(payload).unwrap();
        let prices = normalize_tickers(tickers);

        let btc = &prices["BTCUSDT"];
        assert!((btc.change24h - -7.43).abs() < 1e-9);
        assert_eq!(btc.price, 50000.0);
        assert_eq!(btc.volume, 123456.5);
        assert_eq!(btc.high, 51000.0);
        assert_eq!(btc.low, 48000.0);
        assert_eq!(btc.open, 49000.0);
        assert_eq!(btc.vol_change24h, None);
    }
}
