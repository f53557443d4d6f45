use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::error::{DatabaseError, ErrorKind};
use uuid::Uuid;

use crate::models::screening;
use crate::models::{AiAnalysis, FinancialData, ScreeningFilters, Stock, StockSnapshot, User};
use crate::store::Store;

#[derive(Debug, Clone, Copy)]
enum Constraint {
    Unique,
    ForeignKey,
}

/// Constraint failure reported the way the Postgres driver reports one, so
/// callers can branch on `DatabaseError::kind` whichever store is active.
#[derive(Debug)]
struct ConstraintViolation {
    constraint: Constraint,
    message: String,
}

impl ConstraintViolation {
    fn unique(table: &str) -> sqlx::Error {
        Self::into_sqlx(
            Constraint::Unique,
            format!("duplicate key value violates unique constraint on {table}"),
        )
    }

    fn foreign_key(table: &str) -> sqlx::Error {
        Self::into_sqlx(
            Constraint::ForeignKey,
            format!("insert or update on table {table} violates foreign key constraint on stocks"),
        )
    }

    fn into_sqlx(constraint: Constraint, message: String) -> sqlx::Error {
        sqlx::Error::Database(Box::new(Self { constraint, message }))
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ConstraintViolation {}

impl DatabaseError for ConstraintViolation {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        let code = match self.constraint {
            Constraint::Unique => "23505",
            Constraint::ForeignKey => "23503",
        };
        Some(Cow::Borrowed(code))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.constraint {
            Constraint::Unique => ErrorKind::UniqueViolation,
            Constraint::ForeignKey => ErrorKind::ForeignKeyViolation,
        }
    }
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    // keyed by upper-case symbol
    stocks: HashMap<String, Stock>,
    watchlist: HashSet<(Uuid, Uuid)>,
    financial_data: Vec<FinancialData>,
    analyses: Vec<AiAnalysis>,
}

/// Process-local store with the same semantics as the Postgres schema:
/// unique email/username/symbol, set-valued watchlists, append-only history
/// that must reference a cached stock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn has_stock(tables: &Tables, stock_id: Uuid) -> bool {
        tables.stocks.values().any(|s| s.id == stock_id)
    }

    fn sorted(mut stocks: Vec<Stock>) -> Vec<Stock> {
        stocks.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        stocks
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<User, sqlx::Error> {
        let mut tables = self.tables.write();
        let duplicate = tables
            .users
            .values()
            .any(|u| u.email == user.email || u.username == user.username);
        if duplicate {
            return Err(ConstraintViolation::unique("users"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.tables.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_stock_by_symbol(&self, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
        Ok(self.tables.read().stocks.get(&symbol.to_uppercase()).cloned())
    }

    async fn upsert_stock(&self, snapshot: &StockSnapshot) -> Result<Stock, sqlx::Error> {
        let symbol = snapshot.symbol.to_uppercase();
        let mut tables = self.tables.write();
        let stock = match tables.stocks.get_mut(&symbol) {
            Some(existing) => {
                existing.apply_snapshot(snapshot);
                existing.clone()
            }
            None => {
                let created = Stock::from_snapshot(snapshot.clone());
                tables.stocks.insert(symbol, created.clone());
                created
            }
        };
        Ok(stock)
    }

    async fn list_stocks(&self) -> Result<Vec<Stock>, sqlx::Error> {
        let stocks = self.tables.read().stocks.values().cloned().collect();
        Ok(Self::sorted(stocks))
    }

    async fn screen_stocks(&self, filters: &ScreeningFilters) -> Result<Vec<Stock>, sqlx::Error> {
        let tables = self.tables.read();
        Ok(Self::sorted(screening::screen(tables.stocks.values(), filters)))
    }

    async fn add_to_watchlist(&self, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self.tables.write().watchlist.insert((user_id, stock_id)))
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self.tables.write().watchlist.remove(&(user_id, stock_id)))
    }

    async fn list_watchlist(&self, user_id: Uuid) -> Result<Vec<Stock>, sqlx::Error> {
        let tables = self.tables.read();
        let stocks = tables
            .stocks
            .values()
            .filter(|s| tables.watchlist.contains(&(user_id, s.id)))
            .cloned()
            .collect();
        Ok(Self::sorted(stocks))
    }

    async fn insert_financial_data(&self, rows: &[FinancialData]) -> Result<u64, sqlx::Error> {
        let mut tables = self.tables.write();
        if rows.iter().any(|r| !Self::has_stock(&tables, r.stock_id)) {
            return Err(ConstraintViolation::foreign_key("financial_data"));
        }
        tables.financial_data.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn list_financial_data(&self, stock_id: Uuid) -> Result<Vec<FinancialData>, sqlx::Error> {
        let mut rows: Vec<FinancialData> = self
            .tables
            .read()
            .financial_data
            .iter()
            .filter(|r| r.stock_id == stock_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.fiscal_year
                .cmp(&a.fiscal_year)
                .then(a.fiscal_quarter.cmp(&b.fiscal_quarter))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    async fn insert_analysis(&self, analysis: &AiAnalysis) -> Result<AiAnalysis, sqlx::Error> {
        let mut tables = self.tables.write();
        if !Self::has_stock(&tables, analysis.stock_id) {
            return Err(ConstraintViolation::foreign_key("ai_analysis"));
        }
        tables.analyses.push(analysis.clone());
        Ok(analysis.clone())
    }

    async fn latest_analysis(&self, stock_id: Uuid) -> Result<Option<AiAnalysis>, sqlx::Error> {
        Ok(self
            .tables
            .read()
            .analyses
            .iter()
            .filter(|a| a.stock_id == stock_id)
            .max_by_key(|a| a.analysis_date)
            .cloned())
    }

    async fn list_analyses(&self, stock_id: Uuid) -> Result<Vec<AiAnalysis>, sqlx::Error> {
        let mut rows: Vec<AiAnalysis> = self
            .tables
            .read()
            .analyses
            .iter()
            .filter(|a| a.stock_id == stock_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.analysis_date.cmp(&a.analysis_date));
        Ok(rows)
    }
}
