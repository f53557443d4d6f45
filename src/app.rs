use http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::routes::{auth, health, jobs, stocks, watchlists};
use crate::state::AppState;

pub fn create_app(state: AppState, config: &Config) -> Router {
    let message = config.app_name.clone();
    let version = config.api_version.clone();
    let api = format!("/api/{}", config.api_version);

    Router::<AppState>::new()
        .route(
            "/",
            get(move || async move { Json(json!({ "message": message, "version": version })) }),
        )
        .nest("/health", health::router())
        .nest(&format!("{api}/auth"), auth::router())
        .nest(&format!("{api}/stocks"), stocks::router().merge(watchlists::router()))
        .nest(&format!("{api}/jobs"), jobs::router())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", o);
                None
            }
        })
        .collect();
    info!("CORS configured with {} allowed origins", origins.len());

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}
