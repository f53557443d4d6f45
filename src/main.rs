use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};

use stock_screener_backend::app::create_app;
use stock_screener_backend::auth::AuthKeys;
use stock_screener_backend::config::{Config, ConfigError, StoreBackend};
use stock_screener_backend::external::alphavantage::AlphaVantageClient;
use stock_screener_backend::logging::{init_logging, LoggingConfig};
use stock_screener_backend::services::analysis_service::PlaceholderStrategy;
use stock_screener_backend::services::job_tracker::JobTracker;
use stock_screener_backend::services::rate_limiter::RateLimiter;
use stock_screener_backend::state::AppState;
use stock_screener_backend::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(&LoggingConfig::from_env()?)?;

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("🗄️ Connected to Postgres, migrations applied");
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // One limiter shared by every outbound call
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_calls, config.rate_limit_window));
    let data_provider = AlphaVantageClient::new(
        config.alphavantage_api_key.clone(),
        config.alphavantage_base_url.clone(),
        limiter,
    )?;
    info!(
        "📊 Alpha Vantage client ready ({} calls per {:?})",
        config.rate_limit_calls, config.rate_limit_window
    );

    let state = AppState {
        store,
        data_provider: Arc::new(data_provider),
        analysis_strategy: Arc::new(PlaceholderStrategy),
        auth: AuthKeys::new(config.jwt_secret.clone(), config.access_token_expire_minutes),
        jobs: JobTracker::new(),
        populate_limit: config.populate_limit,
    };

    let app = create_app(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("🚀 {} listening on {}", config.app_name, config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
