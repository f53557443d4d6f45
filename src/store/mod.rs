//! Persistence seam.
//!
//! Services talk to a [`Store`] rather than to a pool directly, so the same
//! service code runs against Postgres in production and against the in-process
//! [`MemoryStore`] in tests and `STORE_BACKEND=memory` deployments.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AiAnalysis, FinancialData, ScreeningFilters, Stock, StockSnapshot, User};

#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn create_user(&self, user: &User) -> Result<User, sqlx::Error>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    // stocks
    async fn find_stock_by_symbol(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error>;
    async fn upsert_stock(&self, snapshot: &StockSnapshot) -> Result<Stock, sqlx::Error>;
    async fn list_stocks(&self) -> Result<Vec<Stock>, sqlx::Error>;
    async fn screen_stocks(&self, filters: &ScreeningFilters) -> Result<Vec<Stock>, sqlx::Error>;

    // watchlist
    async fn add_to_watchlist(&self, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error>;
    async fn remove_from_watchlist(&self, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error>;
    async fn list_watchlist(&self, user_id: Uuid) -> Result<Vec<Stock>, sqlx::Error>;

    // financial history
    async fn insert_financial_data(&self, rows: &[FinancialData]) -> Result<u64, sqlx::Error>;
    async fn list_financial_data(&self, stock_id: Uuid) -> Result<Vec<FinancialData>, sqlx::Error>;

    // analyses
    async fn insert_analysis(&self, analysis: &AiAnalysis) -> Result<AiAnalysis, sqlx::Error>;
    async fn latest_analysis(&self, stock_id: Uuid) -> Result<Option<AiAnalysis>, sqlx::Error>;
    async fn list_analyses(&self, stock_id: Uuid) -> Result<Vec<AiAnalysis>, sqlx::Error>;
}
