use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// One fiscal-period snapshot of a company's statements. Rows are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FinancialData {
    pub id: Uuid,
    pub stock_id: Uuid,
    pub fiscal_year: i32,
    /// NULL for annual figures
    pub fiscal_quarter: Option<i32>,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_debt: Option<f64>,
    pub cash_flow_from_operations: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl FinancialData {
    pub(crate) fn annual(stock_id: Uuid, fiscal_year: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            stock_id,
            fiscal_year,
            fiscal_quarter: None,
            revenue: None,
            net_income: None,
            total_assets: None,
            total_debt: None,
            cash_flow_from_operations: None,
            created_at: Utc::now(),
        }
    }
}
