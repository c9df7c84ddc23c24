use std::time::Duration;

use crate::constants::FETCH_TIMEOUT_SECS;
use crate::exchanges::build_adapter;
use crate::models::ExchangeId;

/// One-shot diagnostic poll: fetch an exchange's ticker and print the
/// highest-volume pairs.
pub async fn run(exchange: &str) {
    let id = match ExchangeId::parse(exchange) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("crypto-scanner/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client");

    let adapter = build_adapter(id, &client);
    println!("📡 Fetching {} ticker...", adapter.display_name());

    let tickers = match adapter.fetch_ticker().await {
        Ok(tickers) => tickers,
        Err(e) => {
            eprintln!("❌ Fetch failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("✅ {} pairs", tickers.len());

    let mut by_volume: Vec<_> = tickers.iter().collect();
    by_volume.sort_by(|a, b| b.1.volume.total_cmp(&a.1.volume));

    println!("   Top pairs by volume:");
    for (symbol, record) in by_volume.into_iter().take(10) {
        println!(
            "   {:<14} price {:>14.6}  vol {:>16.0}  24h {:>+8.3}%",
            symbol, record.price, record.volume, record.change24h
        );
    }
}
