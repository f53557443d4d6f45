use sqlx::PgPool;
use uuid::Uuid;
use crate::models::AiAnalysis;

pub async fn insert(pool: &PgPool, analysis: &AiAnalysis) -> Result<AiAnalysis, sqlx::Error> {
    sqlx::query_as::<_, AiAnalysis>(
        r#"
        INSERT INTO ai_analysis (id, stock_id, executive_summary, sentiment_score,
                                 sentiment_highlights, risk_assessment, red_flags, analysis_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(analysis.id)
    .bind(analysis.stock_id)
    .bind(&analysis.executive_summary)
    .bind(analysis.sentiment_score)
    .bind(&analysis.sentiment_highlights)
    .bind(&analysis.risk_assessment)
    .bind(&analysis.red_flags)
    .bind(analysis.analysis_date)
    .fetch_one(pool)
    .await
}

pub async fn fetch_latest(pool: &PgPool, stock_id: Uuid) -> Result<Option<AiAnalysis>, sqlx::Error> {
    sqlx::query_as::<_, AiAnalysis>(
        "SELECT * FROM ai_analysis WHERE stock_id = $1 ORDER BY analysis_date DESC LIMIT 1",
    )
    .bind(stock_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_all(pool: &PgPool, stock_id: Uuid) -> Result<Vec<AiAnalysis>, sqlx::Error> {
    sqlx::query_as::<_, AiAnalysis>(
        "SELECT * FROM ai_analysis WHERE stock_id = $1 ORDER BY analysis_date DESC",
    )
    .bind(stock_id)
    .fetch_all(pool)
    .await
}
