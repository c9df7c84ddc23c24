use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use super::{get_json, ExchangeAdapter};
use crate::error::Result;
use crate::models::{ExchangeId, TickerMap, TickerRecord};
use crate::utils::parse_f64;

const TICKER_URL: &str = "https://api.kraken.com/0/public/Ticker";

/// Kraken's legacy asset prefixes. "X" marks crypto assets and "Z" fiat;
/// both sides of a pair may carry one (XXBTZUSD = BTC/USD).
const ASSET_PREFIXES: &[(&str, &str)] = &[
    ("XXBT", "BTC"),
    ("XETH", "ETH"),
    ("XXRP", "XRP"),
    ("XLTC", "LTC"),
    ("XXLM", "XLM"),
    ("XXMR", "XMR"),
    ("XZEC", "ZEC"),
    ("XDAO", "DAO"),
    ("XETC", "ETC"),
    ("XREP", "REP"),
    ("XDOG", "DOGE"),
    ("XMLN", "MLN"),
    ("ZUSD", "USD"),
    ("ZEUR", "EUR"),
    ("ZGBP", "GBP"),
    ("ZCAD", "CAD"),
    ("ZJPY", "JPY"),
    ("ZAUD", "AUD"),
];

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    result: Option<HashMap<String, PairTicker>>,
}

/// Kraken packs ticker fields into short-keyed arrays:
/// c = last trade [price, lot volume], o = today's open,
/// v/h/l = [today, last 24h].
#[derive(Debug, Default, Deserialize)]
struct PairTicker {
    #[serde(default)]
    c: Vec<String>,
    #[serde(default)]
    o: String,
    #[serde(default)]
    v: Vec<String>,
    #[serde(default)]
    h: Vec<String>,
    #[serde(default)]
    l: Vec<String>,
}

/// Kraken reports base-denominated volume and no percentage change; the
/// adapter converts volume to quote terms and derives the 24h change from
/// the opening price.
pub struct KrakenAdapter {
    client: reqwest::Client,
}

impl KrakenAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Translate a Kraken pair name to canonical concatenated form.
///
/// The longest known prefix is replaced on the base side first, then the
/// longest known suffix on the quote side, each at most once:
/// "XXBTZUSD" -> "BTCUSD", "ADAUSD" -> "ADAUSD".
pub fn normalize_pair(pair: &str) -> String {
    let mut s = pair.to_string();

    if let Some((prefix, replacement)) = ASSET_PREFIXES
        .iter()
        .filter(|(prefix, _)| s.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
    {
        s = format!("{}{}", replacement, &s[prefix.len()..]);
    }

    if let Some((suffix, replacement)) = ASSET_PREFIXES
        .iter()
        .filter(|(suffix, _)| s.ends_with(suffix))
        .max_by_key(|(suffix, _)| suffix.len())
    {
        s = format!("{}{}", &s[..s.len() - suffix.len()], replacement);
    }

    s
}

#[async_trait]
impl ExchangeAdapter for KrakenAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::Kraken
    }

    fn display_name(&self) -> &'static str {
        "Kraken"
    }

    fn markets(&self) -> &'static [&'static str] {
        &["USD", "USDT", "USDC", "BTC", "ETH"]
    }

    async fn fetch_ticker(&self) -> Result<TickerMap> {
        let response: TickerResponse = get_json(&self.client, TICKER_URL).await?;
        Ok(normalize_tickers(response.result.unwrap_or_default()))
    }
}

fn normalize_tickers(result: HashMap<String, PairTicker>) -> TickerMap {
    let mut prices = TickerMap::new();

    for (pair, t) in result {
        let symbol = normalize_pair(&pair);
        let price = parse_f64(t.c.first().map(String::as_str));
        let open = parse_f64(Some(&t.o));
        let base_volume = parse_f64(t.v.get(1).map(String::as_str));
        let high = parse_f64(t.h.get(1).map(String::as_str));
        let low = parse_f64(t.l.get(1).map(String::as_str));

        let change24h = if open > 0.0 {
            (price - open) / open * 100.0
        } else {
            0.0
        };

        prices.insert(
            symbol,
            TickerRecord {
                price,
                volume: base_volume * price,
                high,
                low,
                open,
                change24h,
                vol_change24h: None,
            },
        );
    }

    prices
}
