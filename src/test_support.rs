use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::external::data_provider::{
    BalanceSheet, CashFlowStatement, CompanyOverview, DataProviderError, ExternalPricePoint,
    FinancialDataProvider, IncomeStatement,
};
use crate::models::{AiAnalysis, FinancialData, ScreeningFilters, Stock, StockSnapshot, User};
use crate::store::{MemoryStore, Store};

/// Provider serving canned payloads. Anything not registered fails with `Empty`.
#[derive(Default)]
pub struct StubProvider {
    overviews: Mutex<HashMap<String, CompanyOverview>>,
    income: Mutex<HashMap<String, IncomeStatement>>,
    balance: Mutex<HashMap<String, BalanceSheet>>,
    cash_flow: Mutex<HashMap<String, CashFlowStatement>>,
    series: Mutex<HashMap<String, Vec<ExternalPricePoint>>>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overview(self, overview: CompanyOverview) -> Self {
        let symbol = overview.symbol.clone().unwrap_or_default();
        self.overviews.lock().insert(symbol, overview);
        self
    }

    pub fn with_income(self, symbol: &str, statement: IncomeStatement) -> Self {
        self.income.lock().insert(symbol.to_string(), statement);
        self
    }

    pub fn with_balance(self, symbol: &str, sheet: BalanceSheet) -> Self {
        self.balance.lock().insert(symbol.to_string(), sheet);
        self
    }

    pub fn with_cash_flow(self, symbol: &str, statement: CashFlowStatement) -> Self {
        self.cash_flow.lock().insert(symbol.to_string(), statement);
        self
    }

    pub fn with_series(self, symbol: &str, points: Vec<ExternalPricePoint>) -> Self {
        self.series.lock().insert(symbol.to_string(), points);
        self
    }

    pub fn set_overview(&self, overview: CompanyOverview) {
        let symbol = overview.symbol.clone().unwrap_or_default();
        self.overviews.lock().insert(symbol, overview);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup<T: Clone>(&self, table: &Mutex<HashMap<String, T>>, symbol: &str) -> Result<T, DataProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        table.lock().get(symbol).cloned().ok_or(DataProviderError::Empty)
    }
}

#[async_trait]
impl FinancialDataProvider for StubProvider {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, DataProviderError> {
        self.lookup(&self.overviews, symbol)
    }

    async fn income_statement(&self, symbol: &str) -> Result<IncomeStatement, DataProviderError> {
        self.lookup(&self.income, symbol)
    }

    async fn balance_sheet(&self, symbol: &str) -> Result<BalanceSheet, DataProviderError> {
        self.lookup(&self.balance, symbol)
    }

    async fn cash_flow(&self, symbol: &str) -> Result<CashFlowStatement, DataProviderError> {
        self.lookup(&self.cash_flow, symbol)
    }

    async fn daily_series(&self, symbol: &str) -> Result<Vec<ExternalPricePoint>, DataProviderError> {
        self.lookup(&self.series, symbol)
    }
}

pub fn overview(symbol: &str, sector: &str, pe_ratio: Option<&str>) -> CompanyOverview {
    CompanyOverview {
        symbol: Some(symbol.to_string()),
        name: Some(format!("{symbol} Holdings")),
        sector: Some(sector.to_string()),
        industry: Some("Software".to_string()),
        market_capitalization: Some("1000000000".to_string()),
        pe_ratio: pe_ratio.map(str::to_string),
        dividend_yield: Some("0.01".to_string()),
        ..Default::default()
    }
}

/// Wraps a [`MemoryStore`] and injects failures into selected calls.
pub struct FaultyStore<'a> {
    inner: &'a MemoryStore,
    hide_users: bool,
    reject_analyses: bool,
}

impl<'a> FaultyStore<'a> {
    pub fn new(inner: &'a MemoryStore) -> Self {
        Self { inner, hide_users: false, reject_analyses: false }
    }

    /// User lookups miss while inserts still hit the real tables, as if
    /// another request created the user in between.
    pub fn hiding_users(mut self) -> Self {
        self.hide_users = true;
        self
    }

    pub fn rejecting_analyses(mut self) -> Self {
        self.reject_analyses = true;
        self
    }
}

#[async_trait]
impl Store for FaultyStore<'_> {
    async fn create_user(&self, user: &User) -> Result<User, sqlx::Error> {
        self.inner.create_user(user).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        if self.hide_users {
            return Ok(None);
        }
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        if self.hide_users {
            return Ok(None);
        }
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        if self.hide_users {
            return Ok(None);
        }
        self.inner.find_user_by_username(username).await
    }

    async fn find_stock_by_symbol(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
        self.inner.find_stock_by_symbol(symbol).await
    }

    async fn upsert_stock(&self, snapshot: &StockSnapshot) -> Result<Stock, sqlx::Error> {
        self.inner.upsert_stock(snapshot).await
    }

    async fn list_stocks(&self) -> Result<Vec<Stock>, sqlx::Error> {
        self.inner.list_stocks().await
    }

    async fn screen_stocks(&self, filters: &ScreeningFilters) -> Result<Vec<Stock>, sqlx::Error> {
        self.inner.screen_stocks(filters).await
    }

    async fn add_to_watchlist(&self, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error> {
        self.inner.add_to_watchlist(user_id, stock_id).await
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error> {
        self.inner.remove_from_watchlist(user_id, stock_id).await
    }

    async fn list_watchlist(&self, user_id: Uuid) -> Result<Vec<Stock>, sqlx::Error> {
        self.inner.list_watchlist(user_id).await
    }

    async fn insert_financial_data(&self, rows: &[FinancialData]) -> Result<u64, sqlx::Error> {
        self.inner.insert_financial_data(rows).await
    }

    async fn list_financial_data(&self, stock_id: Uuid) -> Result<Vec<FinancialData>, sqlx::Error> {
        self.inner.list_financial_data(stock_id).await
    }

    async fn insert_analysis(&self, analysis: &AiAnalysis) -> Result<AiAnalysis, sqlx::Error> {
        if self.reject_analyses {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.inner.insert_analysis(analysis).await
    }

    async fn latest_analysis(&self, stock_id: Uuid) -> Result<Option<AiAnalysis>, sqlx::Error> {
        self.inner.latest_analysis(stock_id).await
    }

    async fn list_analyses(&self, stock_id: Uuid) -> Result<Vec<AiAnalysis>, sqlx::Error> {
        self.inner.list_analyses(stock_id).await
    }
}
