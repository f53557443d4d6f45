use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::WatchlistResponse;
use crate::services::watchlist_service;
use crate::state::AppState;

/// Mounted under `/stocks`; every route requires a bearer token.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(list_watchlist))
        .route("/watchlist/add/:symbol", post(add_item))
        .route("/watchlist/remove/:symbol", delete(remove_item))
}

async fn list_watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WatchlistResponse>, AppError> {
    info!("📋 GET /api/v1/stocks/watchlist - {}", user.username);
    let stocks = watchlist_service::list(state.store.as_ref(), user.id).await?;
    Ok(Json(WatchlistResponse { stocks }))
}

async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, AppError> {
    info!("➕ POST /api/v1/stocks/watchlist/add/{} - {}", symbol, user.username);

    let added =
        watchlist_service::add(state.store.as_ref(), state.data_provider.as_ref(), user.id, &symbol).await?;
    if !added {
        warn!("⚠️ Cannot add unknown symbol {}", symbol);
        return Err(AppError::NotFound("Stock not found".into()));
    }
    Ok(Json(json!({ "message": format!("Added {} to watchlist", symbol) })))
}

async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, AppError> {
    info!("➖ DELETE /api/v1/stocks/watchlist/remove/{} - {}", symbol, user.username);

    if !watchlist_service::remove(state.store.as_ref(), user.id, &symbol).await? {
        return Err(AppError::NotFound("Stock not found in watchlist".into()));
    }
    Ok(Json(json!({ "message": format!("Removed {} from watchlist", symbol) })))
}
