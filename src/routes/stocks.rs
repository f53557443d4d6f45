use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::external::data_provider::ExternalPricePoint;
use crate::jobs::{self, analysis_job, populate_stocks_job, JobContext};
use crate::models::{AiAnalysis, FinancialData, JobKey, JobStatus, ScreeningFilters, Stock};
use crate::services::{analysis_service, stock_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stocks))
        .route("/search/:symbol", get(get_stock))
        .route("/screen", post(screen_stocks))
        .route("/populate", post(populate_stocks))
        .route("/:symbol/history", get(price_history))
        .route("/:symbol/financials", get(financials))
        .route("/:symbol/analysis", get(get_analysis))
        .route("/:symbol/analysis/status", get(analysis_status))
        .route("/:symbol/analysis/history", get(analysis_history))
}

/// Body of a 202 response for work that continues in the background.
#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub detail: String,
    pub job: JobStatus,
}

#[derive(Debug, Serialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub prices: Vec<ExternalPricePoint>,
}

// ==============================================================================
// Lookup & Screening
// ==============================================================================

async fn list_stocks(State(state): State<AppState>) -> Result<Json<Vec<Stock>>, AppError> {
    info!("GET /api/v1/stocks - Listing cached stocks");
    Ok(Json(stock_service::list(state.store.as_ref()).await?))
}

async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Stock>, AppError> {
    info!("GET /api/v1/stocks/search/{} - Looking up stock", symbol);
    let stock = stock_service::get_or_fetch(state.store.as_ref(), state.data_provider.as_ref(), &symbol).await?;
    Ok(Json(stock))
}

async fn screen_stocks(
    State(state): State<AppState>,
    Json(filters): Json<ScreeningFilters>,
) -> Result<Json<Vec<Stock>>, AppError> {
    info!("POST /api/v1/stocks/screen - Screening stocks");
    let stocks = stock_service::screen(state.store.as_ref(), &filters).await?;
    Ok(Json(stocks))
}

async fn populate_stocks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Response {
    info!("📥 POST /api/v1/stocks/populate - Requested by {}", user.username);

    let ctx = JobContext::from(&state);
    let limit = state.populate_limit;
    let started = jobs::spawn_tracked(&state.jobs, JobKey::populate(), async move {
        populate_stocks_job::run_populate_stocks(ctx, limit).await
    });

    let (detail, job) = match started {
        Ok(job) => ("Stock population started in background", job),
        Err(job) => ("Stock population already running", job),
    };
    (StatusCode::ACCEPTED, Json(JobAccepted { detail: detail.to_string(), job })).into_response()
}

// ==============================================================================
// Market Data
// ==============================================================================

async fn price_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceHistory>, AppError> {
    info!("📈 GET /api/v1/stocks/{}/history - Fetching daily closes", symbol);
    let prices =
        stock_service::refresh_price_history(state.store.as_ref(), state.data_provider.as_ref(), &symbol).await?;
    Ok(Json(PriceHistory {
        symbol: symbol.trim().to_uppercase(),
        prices,
    }))
}

async fn financials(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<FinancialData>>, AppError> {
    info!("GET /api/v1/stocks/{}/financials - Financial history", symbol);
    let stock = cached_stock(&state, &symbol).await?;
    let rows = state.store.list_financial_data(stock.id).await?;
    Ok(Json(rows))
}

// ==============================================================================
// Analysis
// ==============================================================================

async fn cached_stock(state: &AppState, symbol: &str) -> Result<Stock, AppError> {
    stock_service::get_by_symbol(state.store.as_ref(), symbol)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock not found".into()))
}

/// Latest analysis, or 202 while a new one is generated in the background.
async fn get_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Response, AppError> {
    info!("🧠 GET /api/v1/stocks/{}/analysis", symbol);
    let stock = cached_stock(&state, &symbol).await?;

    if let Some(analysis) = analysis_service::latest(state.store.as_ref(), stock.id).await? {
        return Ok(Json(analysis).into_response());
    }

    let ctx = JobContext::from(&state);
    let key = JobKey::analysis(stock.id);
    let job = match jobs::spawn_tracked(&state.jobs, key, analysis_job::run_generate_analysis(ctx, stock)) {
        Ok(job) => job,
        Err(running) => running,
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            detail: "Analysis generation started. Please check back in a few moments.".to_string(),
            job,
        }),
    )
        .into_response())
}

async fn analysis_status(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<JobStatus>, AppError> {
    let stock = cached_stock(&state, &symbol).await?;
    state
        .jobs
        .get(JobKey::analysis(stock.id))
        .map(Json)
        .ok_or_else(|| {
            info!("No analysis job recorded for {}", stock.symbol);
            AppError::NotFound(format!("No analysis job for {}", stock.symbol))
        })
}

async fn analysis_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<AiAnalysis>>, AppError> {
    let stock = cached_stock(&state, &symbol).await?;
    Ok(Json(analysis_service::history(state.store.as_ref(), stock.id).await?))
}
