use async_trait::async_trait;
use serde::Deserialize;

use super::{get_json, ExchangeAdapter};
use crate::error::Result;
use crate::models::{ExchangeId, TickerMap, TickerRecord};
use crate::utils::parse_f64;

const TICKER_URL: &str = "https://api.kucoin.com/api/v1/market/allTickers";

#[derive(Debug, Default, Deserialize)]
struct AllTickersResponse {
    #[serde(default)]
    data: Option<AllTickersData>,
}

#[derive(Debug, Default, Deserialize)]
struct AllTickersData {
    #[serde(default)]
    ticker: Option<Vec<KucoinTicker>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KucoinTicker {
    /// Dash-separated, e.g. "BTC-USDT"
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    last: Option<String>,
    /// Quote-denominated 24h volume
    #[serde(default)]
    vol_value: Option<String>,
    #[serde(default)]
    high: Option<String>,
    #[serde(default)]
    low: Option<String>,
    #[serde(default)]
    open: Option<String>,
    /// Fraction, not percent
    #[serde(default)]
    change_rate: Option<String>,
}

pub struct KucoinAdapter {
    client: reqwest::Client,
}

impl KucoinAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExchangeAdapter for KucoinAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::Kucoin
    }

    fn display_name(&self) -> &'static str {
        "KuCoin"
    }

    fn markets(&self) -> &'static [&'static str] {
        &["USDT", "USDC", "BTC", "ETH"]
    }

    async fn fetch_ticker(&self) -> Result<TickerMap> {
        let response: AllTickersResponse = get_json(&self.client, TICKER_URL).await?;
        let tickers = response.data.and_then(|d| d.ticker).unwrap_or_default();
        Ok(normalize_tickers(tickers))
    }
}

fn normalize_tickers(tickers: Vec<KucoinTicker>) -> TickerMap {
    let mut prices = TickerMap::new();

    for t in tickers {
        let symbol = t.symbol.replace('-', "");
        let price = parse_f64(t.last.as_deref());
        let change_rate = parse_f64(t.change_rate.as_deref());

        // allTickers omits the opening price; derive it from the change rate
        let mut open = parse_f64(t.open.as_deref());
        if open == 0.0 {
            open = price / (1.0 + change_rate);
        }

        prices.insert(
            symbol,
            TickerRecord {
                price,
                volume: parse_f64(t.vol_value.as_deref()),
                high: parse_f64(t.high.as_deref()),
                low: parse_f64(t.low.as_deref()),
                open,
                change24h: change_rate * 100.0,
                vol_change24h: None,
            },
        );
    }

    prices
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "code": "200000",
        "data": {
            "time": 1700000000000,
            "ticker": [
                {
                    "symbol": "BTC-USDT",
                    "last": "50000",
                    "volValue": "987654.3",
                    "high": "51000",
                    "low": "48000",
                    "changeRate": "0.25"
                }
            ]
        }
    }"#;

    #[test]
    fn test_normalize_tickers() {
        let response: AllTickersResponse = serde_json::from_str(SAMPLE).unwrap();
        let tickers = response.data.and_then(|d| d.ticker).unwrap();
        let prices = normalize_tickers(tickers);

        let btc = &prices["BTCUSDT"];
        assert_eq!(btc.price, 50000.0);
        assert_eq!(btc.volume, 987654.3);
        assert_eq!(btc.change24h, 25.0);
        // open derived from the change rate: 50000 / 1.25
        assert_eq!(btc.open, 40000.0);
        assert_eq!(btc.vol_change24h, None);
    }

    #[test]
    fn test_missing_ticker_list_is_empty() {
        let response: AllTickersResponse =
            serde_json::from_str(r#"{"code": "200000", "data": {}}"#).unwrap();
        let tickers = response.data.and_then(|d| d.ticker).unwrap_or_default();
        assert!(normalize_tickers(tickers).is_empty());
    }
}
