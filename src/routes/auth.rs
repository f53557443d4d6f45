use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, User};
use crate::services::auth_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    info!("POST /api/v1/auth/register - Registering {}", req.username);
    let user = auth_service::register(state.store.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    info!("POST /api/v1/auth/login - Login attempt for {}", req.username);
    let token = auth_service::login(state.store.as_ref(), &state.auth, req).await?;
    Ok(Json(token))
}
