//! Category Index
//!
//! Background-maintained mapping from coin symbol to CoinGecko category
//! tags, used to decorate scanner results. The index persists to a JSON
//! cache file so tags survive restarts, and refreshes every 6 hours.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::constants::{
    CATEGORY_CHECK_SECS, CATEGORY_FETCH_PACE_SECS, CATEGORY_RATE_LIMIT_BACKOFF_SECS,
    CATEGORY_REFRESH_SECS,
};
use crate::error::{AppError, Result};
use crate::models::TimeframeResult;

const MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";
const TOP_100_ID: &str = "top-100";

/// Curated category set, chosen for crypto traders
const TARGET_CATEGORIES: &[(&str, &str)] = &[
    ("layer-1", "Layer 1"),
    ("layer-2", "Layer 2"),
    ("artificial-intelligence", "AI"),
    ("ai-agents", "AI Agents"),
    ("meme-token", "Meme"),
    ("defi", "DeFi"),
    ("gaming", "Gaming"),
    ("real-world-assets-rwa", "RWA"),
    ("privacy-coins", "Privacy"),
    ("solana-ecosystem", "Solana Eco"),
    ("base-ecosystem", "Base Eco"),
    ("ethereum-ecosystem", "Ethereum Eco"),
    ("decentralized-exchange-dex", "DEX"),
    ("non-fungible-tokens-nft", "NFT"),
    ("oracle", "Oracle"),
    ("zero-knowledge-zk", "ZK"),
    ("decentralized-science-desci", "DeSci"),
    ("pump-fun", "Pump.fun"),
];

/// Quote suffixes stripped when a display symbol arrives without a slash
const QUOTE_SUFFIXES: &[&str] = &["USDT", "USDC", "USD", "BTC", "ETH"];

#[derive(Debug, Default)]
struct CategoryIndex {
    /// Uppercase base symbol -> category ids
    symbol_categories: HashMap<String, HashSet<String>>,
    category_names: HashMap<String, String>,
    last_fetch: Option<DateTime<Utc>>,
    ready: bool,
}

/// On-disk shape of the category cache
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    symbol_categories: HashMap<String, Vec<String>>,
    category_names: HashMap<String, String>,
    last_fetch: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct MarketCoin {
    symbol: String,
}

/// One category with its mapped-coin count, for the categories endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub id: String,
    pub name: String,
    pub count: usize,
}

pub type SharedCategories = Arc<CategoryService>;

pub struct CategoryService {
    client: reqwest::Client,
    cache_path: PathBuf,
    index: RwLock<CategoryIndex>,
}

impl CategoryService {
    pub fn new(client: reqwest::Client, cache_path: PathBuf) -> Self {
        Self {
            client,
            cache_path,
            index: RwLock::new(CategoryIndex::default()),
        }
    }

    /// Background task: restore from cache, fetch fresh data, then refresh
    /// whenever the index grows stale. Never fails the process.
    pub async fn run(self: Arc<Self>) {
        if let Err(e) = self.load_cache().await {
            warn!(error = %e, "Category cache load failed");
        }

        loop {
            let stale = {
                let index = self.index.read().await;
                index
                    .last_fetch
                    .map_or(true, |t| Utc::now() - t > Duration::seconds(CATEGORY_REFRESH_SECS as i64))
            };

            if stale {
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "Category refresh failed");
                }
            }

            sleep(std::time::Duration::from_secs(CATEGORY_CHECK_SECS)).await;
        }
    }

    pub async fn ready(&self) -> bool {
        self.index.read().await.ready
    }

    /// Attach category tags to resolved results. A no-op until the index
    /// has data.
    pub async fn annotate<'a, I>(&self, items: I)
    where
        I: IntoIterator<Item = &'a mut TimeframeResult>,
    {
        let index = self.index.read().await;
        if !index.ready {
            return;
        }
        for item in items {
            item.categories = Some(index.categories_for(&item.display_symbol));
        }
    }

    /// Available categories in display order, Top 100 first
    pub async fn category_list(&self) -> Vec<CategoryCount> {
        let index = self.index.read().await;
        let mut list = Vec::new();

        let count_for = |id: &str| {
            index
                .symbol_categories
                .values()
                .filter(|cats| cats.contains(id))
                .count()
        };

        let top_count = count_for(TOP_100_ID);
        if top_count > 0 {
            list.push(CategoryCount {
                id: TOP_100_ID.to_string(),
                name: "Top 100".to_string(),
                count: top_count,
            });
        }
        for (id, name) in TARGET_CATEGORIES {
            let count = count_for(id);
            if count > 0 {
                list.push(CategoryCount {
                    id: id.to_string(),
                    name: name.to_string(),
                    count,
                });
            }
        }

        list
    }

    async fn load_cache(&self) -> Result<()> {
        if !self.cache_path.exists() {
            return Ok(());
        }
        let contents = std::fs::read_to_string(&self.cache_path)?;
        let cache: CacheFile = serde_json::from_str(&contents)?;

        let mut index = self.index.write().await;
        index.symbol_categories = cache
            .symbol_categories
            .into_iter()
            .map(|(symbol, cats)| (symbol, cats.into_iter().collect()))
            .collect();
        index.category_names = cache.category_names;
        index.last_fetch = cache.last_fetch;
        index.ready = !index.symbol_categories.is_empty();

        info!(
            symbols = index.symbol_categories.len(),
            "Category index restored from cache"
        );
        Ok(())
    }

    async fn save_cache(&self) -> Result<()> {
        let index = self.index.read().await;
        let cache = CacheFile {
            symbol_categories: index
                .symbol_categories
                .iter()
                .map(|(symbol, cats)| (symbol.clone(), cats.iter().cloned().collect()))
                .collect(),
            category_names: index.category_names.clone(),
            last_fetch: index.last_fetch,
        };
        drop(index);

        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.cache_path, serde_json::to_string(&cache)?)?;
        Ok(())
    }

    /// Fetch the top-100 list and every target category, pacing requests to
    /// stay under the CoinGecko free-tier rate limit.
    async fn refresh(&self) -> Result<()> {
        info!("Fetching coin categories from CoinGecko");
        let mut total_mapped = 0usize;

        match self
            .fetch_market_page(&format!(
                "{}?vs_currency=usd&order=market_cap_desc&per_page=100&page=1&sparkline=false",
                MARKETS_URL
            ))
            .await
        {
            Ok(coins) => {
                total_mapped += coins.len();
                self.merge(TOP_100_ID, "Top 100", &coins).await;
            }
            Err(e) => warn!(category = TOP_100_ID, error = %e, "Category fetch failed"),
        }
        sleep(std::time::Duration::from_secs(CATEGORY_FETCH_PACE_SECS)).await;

        for (id, name) in TARGET_CATEGORIES {
            let url = format!(
                "{}?vs_currency=usd&category={}&per_page=250&page=1&sparkline=false",
                MARKETS_URL, id
            );
            match self.fetch_market_page(&url).await {
                Ok(coins) => {
                    total_mapped += coins.len();
                    self.merge(id, name, &coins).await;
                }
                Err(e) => warn!(category = id, error = %e, "Category fetch failed"),
            }
            sleep(std::time::Duration::from_secs(CATEGORY_FETCH_PACE_SECS)).await;
        }

        {
            let mut index = self.index.write().await;
            index.last_fetch = Some(Utc::now());
            index.ready = true;
        }
        if let Err(e) = self.save_cache().await {
            warn!(error = %e, "Category cache save failed");
        }

        let index = self.index.read().await;
        info!(
            symbols = index.symbol_categories.len(),
            mappings = total_mapped,
            "Category mapping complete"
        );
        Ok(())
    }

    /// One markets-page request, with a single retry after a rate-limit
    /// backoff
    async fn fetch_market_page(&self, url: &str) -> Result<Vec<MarketCoin>> {
        for attempt in 0..2 {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS && attempt == 0 {
                warn!("CoinGecko rate limited, backing off");
                sleep(std::time::Duration::from_secs(
                    CATEGORY_RATE_LIMIT_BACKOFF_SECS,
                ))
                .await;
                continue;
            }
            if !status.is_success() {
                return Err(AppError::Network(format!(
                    "{} returned HTTP {}",
                    url, status
                )));
            }
            return response
                .json::<Vec<MarketCoin>>()
                .await
                .map_err(|e| AppError::Parse(format!("{}: {}", url, e)));
        }

        Err(AppError::Network("rate limited twice".to_string()))
    }

    async fn merge(&self, id: &str, name: &str, coins: &[MarketCoin]) {
        let mut index = self.index.write().await;
        index.category_names.insert(id.to_string(), name.to_string());
        for coin in coins {
            index
                .symbol_categories
                .entry(coin.symbol.to_uppercase())
                .or_default()
                .insert(id.to_string());
        }
    }
}

impl CategoryIndex {
    /// Resolve a display symbol ("BTC/USD" or "BTCUSD") to its tags,
    /// matching on the base side
    fn categories_for(&self, display_symbol: &str) -> Vec<String> {
        let base = match display_symbol.split('/').next() {
            Some(base) if !base.is_empty() && base != display_symbol => base,
            _ => strip_quote_suffix(display_symbol),
        };

        let mut categories: Vec<String> = self
            .symbol_categories
            .get(&base.to_uppercase())
            .map(|cats| cats.iter().cloned().collect())
            .unwrap_or_default();
        categories.sort();
        categories
    }
}

fn strip_quote_suffix(symbol: &str) -> &str {
    for suffix in QUOTE_SUFFIXES {
        if let Some(base) = symbol.strip_suffix(suffix) {
            if !base.is_empty() {
                return base;
            }
        }
    }
    symbol
}
