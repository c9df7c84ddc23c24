use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{get_json, ExchangeAdapter};
use crate::constants::COINBASE_PAGE_LIMIT;
use crate::error::Result;
use crate::models::{ExchangeId, TickerMap, TickerRecord};
use crate::utils::parse_f64;

const PRODUCTS_URL: &str = "https://api.coinbase.com/api/v3/brokerage/market/products";

/// Coinbase brokerage market products response (one page)
#[derive(Debug, Default, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Default, Deserialize)]
struct Product {
    #[serde(default)]
    product_id: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    price_percentage_change_24h: Option<String>,
    /// 24h volume in base currency
    #[serde(default)]
    volume_24h: Option<String>,
    #[serde(default)]
    volume_percentage_change_24h: Option<String>,
    #[serde(default)]
    is_disabled: bool,
    #[serde(default)]
    status: String,
}

/// Coinbase does not report high/low in its product listing; those stay 0
/// and the engine's running tracker fills them in. The opening price is
/// synthesized from the 24h change.
pub struct CoinbaseAdapter {
    client: reqwest::Client,
}

impl CoinbaseAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch every page of the spot product list until a short page
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let mut all_products = Vec::new();
        let mut offset = 0usize;

        loop {
            let url = format!(
                "{}?limit={}&offset={}&product_type=SPOT",
                PRODUCTS_URL, COINBASE_PAGE_LIMIT, offset
            );
            let page: ProductsPage = get_json(&self.client, &url).await?;

            let page_len = page.products.len();
            if page_len == 0 {
                break;
            }
            all_products.extend(page.products);
            if page_len < COINBASE_PAGE_LIMIT {
                break;
            }
            offset += COINBASE_PAGE_LIMIT;
        }

        debug!(products = all_products.len(), "Coinbase product list fetched");
        Ok(all_products)
    }
}

#[async_trait]
impl ExchangeAdapter for CoinbaseAdapter {
    fn id(&self) -> ExchangeId {
        ExchangeId::Coinbase
    }

    fn display_name(&self) -> &'static str {
        "Coinbase"
    }

    fn markets(&self) -> &'static [&'static str] {
        &["USD", "USDT", "USDC", "BTC", "ETH"]
    }

    async fn fetch_ticker(&self) -> Result<TickerMap> {
        let products = self.fetch_products().await?;
        Ok(normalize_products(products))
    }
}

fn normalize_products(products: Vec<Product>) -> TickerMap {
    let mut prices = TickerMap::new();

    for p in products {
        if p.is_disabled || p.status != "online" {
            continue;
        }
        let price = parse_f64(p.price.as_deref());
        if price == 0.0 {
            continue;
        }

        let symbol = p.product_id.replace('-', "");
        let change24h = parse_f64(p.price_percentage_change_24h.as_deref());
        // volume_24h is base-denominated; convert to quote volume
        let quote_volume = parse_f64(p.volume_24h.as_deref()) * price;

        prices.insert(
            symbol,
            TickerRecord {
                price,
                volume: quote_volume,
                high: 0.0,
                low: 0.0,
                open: price / (1.0 + change24h / 100.0),
                change24h,
                vol_change24h: Some(parse_f64(p.volume_percentage_change_24h.as_deref())),
            },
        );
    }

    prices
}
