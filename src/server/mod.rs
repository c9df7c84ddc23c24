pub mod api;

use axum::{extract::FromRef, routing::get, Router};
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::engine::SharedEngine;
use crate::services::SharedCategories;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub categories: SharedCategories,
    pub started_at: Instant,
}

// FromRef implementations to extract specific state components
impl FromRef<AppState> for SharedEngine {
    fn from_ref(app_state: &AppState) -> SharedEngine {
        app_state.engine.clone()
    }
}

impl FromRef<AppState> for SharedCategories {
    fn from_ref(app_state: &AppState) -> SharedCategories {
        app_state.categories.clone()
    }
}

/// Start the axum server
pub async fn serve(
    engine: SharedEngine,
    categories: SharedCategories,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = AppState {
        engine,
        categories,
        started_at: Instant::now(),
    };

    // The scanner API is read-only and public
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    tracing::info!("Registering routes:");
    tracing::info!("  GET /api/scanner/data?exchange=coinbase&timeframe=15m&market=USD");
    tracing::info!("  GET /api/scanner/sparkline?exchange=coinbase&symbol=BTCUSD");
    tracing::info!("  GET /api/scanner/status");
    tracing::info!("  GET /api/scanner/exchanges");
    tracing::info!("  GET /api/scanner/categories");
    tracing::info!("  GET /health");

    let app = Router::new()
        .route("/api/scanner/data", get(api::scanner_data_handler))
        .route("/api/scanner/sparkline", get(api::sparkline_handler))
        .route("/api/scanner/status", get(api::status_handler))
        .route("/api/scanner/exchanges", get(api::exchanges_handler))
        .route("/api/scanner/categories", get(api::categories_handler))
        .route("/health", get(api::health_handler))
        .layer(cors)
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
