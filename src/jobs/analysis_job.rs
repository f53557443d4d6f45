use tracing::info;

use crate::errors::AppError;
use crate::jobs::JobContext;
use crate::models::{JobResult, Stock};
use crate::services::analysis_service;

pub async fn run_generate_analysis(ctx: JobContext, stock: Stock) -> Result<JobResult, AppError> {
    info!("Starting analysis job for {}", stock.symbol);

    analysis_service::generate(
        ctx.store.as_ref(),
        ctx.provider.as_ref(),
        ctx.strategy.as_ref(),
        &stock,
    )
    .await?;

    Ok(JobResult {
        items_processed: 1,
        items_failed: 0,
    })
}
