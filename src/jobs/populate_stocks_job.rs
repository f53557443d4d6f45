use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::jobs::JobContext;
use crate::models::JobResult;
use crate::services::stock_service;

/// Large-cap constituents of the S&P 500 used to seed the stock cache.
pub const SP500_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "AMZN", "GOOGL", "TSLA", "META", "NVDA", "JPM", "JNJ", "V", "PG", "UNH", "HD",
    "MA", "DIS", "PYPL", "BAC", "NFLX", "ADBE", "CRM", "CMCSA", "XOM", "VZ", "KO", "ABT", "ORCL",
    "PFE", "WMT", "CVX", "CSCO", "PEP", "TMO", "ACN", "ABBV", "COST", "AVGO", "DHR", "LLY", "NEE",
    "TXN", "MDT", "UNP", "PM", "HON", "LOW", "QCOM", "IBM", "CHTR", "LIN", "UPS", "RTX", "BMY",
    "AMGN",
];

/// Fetch and cache the first `limit` symbols of [`SP500_SYMBOLS`].
///
/// Symbols are processed one at a time; the provider's rate limiter paces the
/// calls. A symbol that cannot be fetched is counted as failed and skipped.
pub async fn run_populate_stocks(ctx: JobContext, limit: usize) -> Result<JobResult, AppError> {
    let symbols = &SP500_SYMBOLS[..limit.min(SP500_SYMBOLS.len())];
    info!("Populating {} stocks", symbols.len());

    let mut processed = 0;
    let mut failed = 0;

    for symbol in symbols {
        match stock_service::upsert_from_provider(ctx.store.as_ref(), ctx.provider.as_ref(), symbol).await {
            Ok(Some(_)) => processed += 1,
            Ok(None) => {
                warn!("No data for {}, skipping", symbol);
                failed += 1;
            }
            Err(e) => {
                error!("Failed to populate {}: {}", symbol, e);
                failed += 1;
            }
        }
    }

    info!("✅ Populate finished: {} stored, {} failed", processed, failed);
    Ok(JobResult {
        items_processed: processed,
        items_failed: failed,
    })
}
