use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::{AiAnalysis, FinancialData, ScreeningFilters, Stock, StockSnapshot, User};
use crate::store::Store;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &User) -> Result<User, sqlx::Error> {
        db::user_queries::insert(&self.pool, user).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        db::user_queries::fetch_by_id(&self.pool, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        db::user_queries::fetch_by_email(&self.pool, email).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        db::user_queries::fetch_by_username(&self.pool, username).await
    }

    async fn find_stock_by_symbol(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
        db::stock_queries::fetch_by_symbol(&self.pool, symbol).await
    }

    async fn upsert_stock(&self, snapshot: &StockSnapshot) -> Result<Stock, sqlx::Error> {
        db::stock_queries::upsert(&self.pool, snapshot).await
    }

    async fn list_stocks(&self) -> Result<Vec<Stock>, sqlx::Error> {
        db::stock_queries::fetch_all(&self.pool).await
    }

    async fn screen_stocks(&self, filters: &ScreeningFilters) -> Result<Vec<Stock>, sqlx::Error> {
        db::stock_queries::screen(&self.pool, filters).await
    }

    async fn add_to_watchlist(&self, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error> {
        db::watchlist_queries::add(&self.pool, user_id, stock_id).await
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error> {
        db::watchlist_queries::remove(&self.pool, user_id, stock_id).await
    }

    async fn list_watchlist(&self, user_id: Uuid) -> Result<Vec<Stock>, sqlx::Error> {
        db::watchlist_queries::fetch_stocks(&self.pool, user_id).await
    }

    async fn insert_financial_data(&self, rows: &[FinancialData]) -> Result<u64, sqlx::Error> {
        db::financial_data_queries::insert_many(&self.pool, rows).await
    }

    async fn list_financial_data(&self, stock_id: Uuid) -> Result<Vec<FinancialData>, sqlx::Error> {
        db::financial_data_queries::fetch_for_stock(&self.pool, stock_id).await
    }

    async fn insert_analysis(&self, analysis: &AiAnalysis) -> Result<AiAnalysis, sqlx::Error> {
        db::analysis_queries::insert(&self.pool, analysis).await
    }

    async fn latest_analysis(&self, stock_id: Uuid) -> Result<Option<AiAnalysis>, sqlx::Error> {
        db::analysis_queries::fetch_latest(&self.pool, stock_id).await
    }

    async fn list_analyses(&self, stock_id: Uuid) -> Result<Vec<AiAnalysis>, sqlx::Error> {
        db::analysis_queries::fetch_all(&self.pool, stock_id).await
    }
}
