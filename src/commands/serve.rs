use std::sync::Arc;
use std::time::Duration;

use crate::constants::FETCH_TIMEOUT_SECS;
use crate::engine::{PriceEngine, SharedEngine};
use crate::exchanges::build_adapters;
use crate::server;
use crate::services::CategoryService;
use crate::utils::{get_categories_cache_path, get_poll_interval};
use crate::worker;

pub async fn run(port: u16) {
    println!("🚀 Starting crypto-scanner server on port {}", port);

    let client = match build_http_client() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let engine: SharedEngine = Arc::new(PriceEngine::new(build_adapters(&client)));
    let exchange_names: Vec<String> = engine
        .exchange_ids()
        .iter()
        .map(|id| id.to_string())
        .collect();
    println!("📡 Exchanges: {}", exchange_names.join(", "));

    let poll_interval = get_poll_interval();
    println!("⏱️  Poll interval: {}s", poll_interval.as_secs());
    worker::spawn_pollers(&engine, poll_interval);

    let cache_path = get_categories_cache_path();
    println!("🏷️  Category cache: {}", cache_path.display());
    let categories = Arc::new(CategoryService::new(client, cache_path));
    tokio::spawn(categories.clone().run());

    if let Err(e) = server::serve(engine, categories, port).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}

fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("crypto-scanner/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
}
