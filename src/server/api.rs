use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::models::{
    AggregatedResult, ExchangeInfo, ExchangeSelect, HistoryInfo, TimeframeResult, Timeframe,
};
use crate::server::AppState;
use crate::services::CategoryCount;

/// Query parameters for /api/scanner/data
#[derive(Debug, Deserialize)]
pub struct ScannerQuery {
    /// Exchange id, or "all" for the aggregated view
    #[serde(default = "default_exchange")]
    pub exchange: String,

    /// Timeframe token: 1m, 5m, 15m, 30m, 1h, 4h, 24h
    #[serde(default = "default_timeframe")]
    pub timeframe: String,

    /// Quote-currency filter, e.g. USD or USDT
    #[serde(default = "default_market")]
    pub market: String,
}

/// Query parameters for /api/scanner/sparkline
#[derive(Debug, Deserialize)]
pub struct SparklineQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,

    #[serde(default)]
    pub symbol: String,
}

/// Query parameters for /api/scanner/status
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub exchange: Option<String>,
}

fn default_exchange() -> String {
    "coinbase".to_string()
}

fn default_timeframe() -> String {
    "15m".to_string()
}

fn default_market() -> String {
    "USD".to_string()
}

#[derive(Debug, Serialize)]
struct ScannerResponse<T: Serialize> {
    exchange: String,
    pairs: usize,
    timeframe: Timeframe,
    market: String,
    history: HistoryInfo,
    data: Vec<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CategoriesResponse {
    ready: bool,
    categories: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    categories_ready: bool,
    exchanges: Vec<ExchangeInfo>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
}

/// GET /api/scanner/data - Timeframe deltas for one exchange or all
///
/// Examples:
/// - /api/scanner/data (defaults: coinbase, 15m, USD)
/// - /api/scanner/data?exchange=kraken&timeframe=1h&market=USD
/// - /api/scanner/data?exchange=all&timeframe=24h&market=USDT
#[instrument(skip(app_state))]
pub async fn scanner_data_handler(
    State(app_state): State<AppState>,
    Query(params): Query<ScannerQuery>,
) -> Response {
    let select = match ExchangeSelect::parse(&params.exchange) {
        Ok(select) => select,
        Err(e) => return bad_request(e),
    };
    let timeframe = match Timeframe::parse(&params.timeframe) {
        Ok(timeframe) => timeframe,
        Err(e) => return bad_request(e),
    };

    let history = app_state.engine.history_info(select).await;

    match select {
        ExchangeSelect::All => {
            let mut data: Vec<AggregatedResult> = app_state
                .engine
                .all_exchanges_data(timeframe, &params.market)
                .await;
            app_state
                .categories
                .annotate(data.iter_mut().map(|item| &mut item.result))
                .await;

            info!(pairs = data.len(), %timeframe, market = %params.market, "Returning aggregated scanner data");
            Json(ScannerResponse {
                exchange: "all".to_string(),
                pairs: data.len(),
                timeframe,
                market: params.market,
                history,
                data,
            })
            .into_response()
        }
        ExchangeSelect::One(id) => {
            let mut data: Vec<TimeframeResult> = app_state
                .engine
                .timeframe_data(id, timeframe, &params.market)
                .await;
            app_state.categories.annotate(data.iter_mut()).await;

            info!(exchange = %id, pairs = data.len(), %timeframe, market = %params.market, "Returning scanner data");
            Json(ScannerResponse {
                exchange: id.to_string(),
                pairs: data.len(),
                timeframe,
                market: params.market,
                history,
                data,
            })
            .into_response()
        }
    }
}

/// GET /api/scanner/sparkline - Price trajectory for one symbol, max 30 points
#[instrument(skip(app_state))]
pub async fn sparkline_handler(
    State(app_state): State<AppState>,
    Query(params): Query<SparklineQuery>,
) -> Response {
    let select = match ExchangeSelect::parse(&params.exchange) {
        Ok(select) => select,
        Err(e) => return bad_request(e),
    };

    let points = app_state.engine.sparkline_data(select, &params.symbol).await;
    Json(points).into_response()
}

/// GET /api/scanner/status - History coverage, one exchange or all keyed by id
#[instrument(skip(app_state))]
pub async fn status_handler(
    State(app_state): State<AppState>,
    Query(params): Query<StatusQuery>,
) -> Response {
    match params.exchange {
        Some(exchange) => {
            let select = match ExchangeSelect::parse(&exchange) {
                Ok(select) => select,
                Err(e) => return bad_request(e),
            };
            Json(app_state.engine.history_info(select).await).into_response()
        }
        None => {
            let all: BTreeMap<String, HistoryInfo> =
                app_state.engine.history_info_all_exchanges().await;
            Json(all).into_response()
        }
    }
}

/// GET /api/scanner/exchanges - Registered exchanges with live counters
#[instrument(skip(app_state))]
pub async fn exchanges_handler(State(app_state): State<AppState>) -> Json<Vec<ExchangeInfo>> {
    Json(app_state.engine.exchanges())
}

/// GET /api/scanner/categories - Category index state
#[instrument(skip(app_state))]
pub async fn categories_handler(State(app_state): State<AppState>) -> Json<CategoriesResponse> {
    let response = CategoriesResponse {
        ready: app_state.categories.ready().await,
        categories: app_state.categories.category_list().await,
    };
    Json(response)
}

/// GET /health - Process health summary
#[instrument(skip(app_state))]
pub async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: app_state.started_at.elapsed().as_secs(),
        categories_ready: app_state.categories.ready().await,
        exchanges: app_state.engine.exchanges(),
    })
}
