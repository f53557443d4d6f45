use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    PopulateStocks,
    GenerateAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
}

/// A background job is identified by its kind and, for per-stock jobs, the stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub kind: JobKind,
    pub stock_id: Option<Uuid>,
}

impl JobKey {
    pub fn populate() -> Self {
        Self { kind: JobKind::PopulateStocks, stock_id: None }
    }

    pub fn analysis(stock_id: Uuid) -> Self {
        Self { kind: JobKind::GenerateAnalysis, stock_id: Some(stock_id) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub kind: JobKind,
    pub stock_id: Option<Uuid>,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub items_processed: u32,
    pub items_failed: u32,
    pub message: Option<String>,
}

/// Outcome reported by a finished job.
#[derive(Debug, Clone, Default)]
pub struct JobResult {
    pub items_processed: u32,
    pub items_failed: u32,
}
