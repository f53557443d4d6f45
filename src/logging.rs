//! Tracing setup: an `EnvFilter` plus console output, and log shipping to Loki
//! when `LOKI_URL` is set and the `loki` feature is compiled in.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use crate::config::ConfigError;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, from `RUST_LOG`
    pub filter: String,
    /// Value of the `service` label on shipped lines
    pub service_name: String,
    pub loki_url: Option<Url>,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let loki_url = match lookup("LOKI_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid {
                key: "LOKI_URL",
                value: raw,
            })?),
            None => None,
        };

        Ok(Self {
            filter: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "stock-screener".to_string()),
            loki_url,
        })
    }
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::new(&config.filter))
        .with(tracing_subscriber::fmt::layer());

    #[cfg(feature = "loki")]
    let registry = registry.with(loki_layer(config)?);

    registry.try_init()?;

    match &config.loki_url {
        Some(url) if cfg!(feature = "loki") => {
            tracing::info!("✅ Logging for {} shipped to Loki at {}", config.service_name, url)
        }
        Some(url) => tracing::warn!("LOKI_URL {} ignored, built without the loki feature", url),
        None => tracing::info!("📊 Console logging initialized for {}", config.service_name),
    }
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig) -> Result<Option<tracing_loki::Layer>, tracing_loki::Error> {
    let Some(url) = config.loki_url.clone() else {
        return Ok(None);
    };

    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .build_url(url)?;
    // background sender lives as long as the runtime
    tokio::spawn(task);

    Ok(Some(layer))
}
