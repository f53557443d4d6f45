use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    pub category: String,
    pub description: String,
    pub severity: Severity,
}

/// Stored analysis of a stock. Several rows may exist per stock; the one with the
/// newest `analysis_date` is current.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AiAnalysis {
    pub id: Uuid,
    pub stock_id: Uuid,
    pub executive_summary: String,
    /// -1.0 (bearish) to 1.0 (bullish)
    pub sentiment_score: f64,
    pub sentiment_highlights: Json<Vec<String>>,
    pub risk_assessment: Json<Vec<RiskEntry>>,
    pub red_flags: Json<Vec<RedFlag>>,
    pub analysis_date: DateTime<Utc>,
}

/// NaN carries no signal and reads as neutral.
fn bounded_sentiment(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(-1.0, 1.0)
    }
}

impl AiAnalysis {
    pub(crate) fn new(
        stock_id: Uuid,
        executive_summary: String,
        sentiment_score: f64,
        sentiment_highlights: Vec<String>,
        risk_assessment: Vec<RiskEntry>,
        red_flags: Vec<RedFlag>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            stock_id,
            executive_summary,
            sentiment_score: bounded_sentiment(sentiment_score),
            sentiment_highlights: Json(sentiment_highlights),
            risk_assessment: Json(risk_assessment),
            red_flags: Json(red_flags),
            analysis_date: Utc::now(),
        }
    }
}
