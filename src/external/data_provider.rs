use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
pub struct ExternalPricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Error)]
pub enum DataProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("empty payload")]
    Empty,
}

/// Provider numbers arrive as strings and use "None" or "-" for missing values.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw == "None" || raw == "-" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_text(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() || raw == "None" || raw == "-" {
        return None;
    }
    Some(raw.to_string())
}

// ---------------------------------------------------------------------------
// OVERVIEW
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    #[serde(rename = "Industry")]
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_capitalization: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio")]
    pub price_to_book_ratio: Option<String>,
    #[serde(rename = "DividendYield")]
    pub dividend_yield: Option<String>,
    #[serde(rename = "DebtToEquityRatio")]
    pub debt_to_equity_ratio: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    pub return_on_equity_ttm: Option<String>,
    #[serde(rename = "ProfitMargin")]
    pub profit_margin: Option<String>,
    #[serde(rename = "Price")]
    pub price: Option<String>,
}

impl CompanyOverview {
    pub fn name(&self) -> Option<String> {
        parse_text(self.name.as_deref())
    }

    pub fn sector(&self) -> Option<String> {
        parse_text(self.sector.as_deref())
    }

    pub fn industry(&self) -> Option<String> {
        parse_text(self.industry.as_deref())
    }

    pub fn market_cap(&self) -> Option<f64> {
        parse_number(self.market_capitalization.as_deref())
    }

    pub fn pe_ratio(&self) -> Option<f64> {
        parse_number(self.pe_ratio.as_deref())
    }

    pub fn pb_ratio(&self) -> Option<f64> {
        parse_number(self.price_to_book_ratio.as_deref())
    }

    pub fn dividend_yield(&self) -> Option<f64> {
        parse_number(self.dividend_yield.as_deref())
    }

    pub fn debt_to_equity(&self) -> Option<f64> {
        parse_number(self.debt_to_equity_ratio.as_deref())
    }

    pub fn roe(&self) -> Option<f64> {
        parse_number(self.return_on_equity_ttm.as_deref())
    }

    pub fn profit_margin(&self) -> Option<f64> {
        parse_number(self.profit_margin.as_deref())
    }

    pub fn price(&self) -> Option<f64> {
        parse_number(self.price.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeReport {
    pub fiscal_date_ending: String,
    pub total_revenue: Option<String>,
    pub net_income: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    #[serde(default)]
    pub annual_reports: Vec<IncomeReport>,
    #[serde(default)]
    pub quarterly_reports: Vec<IncomeReport>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub fiscal_date_ending: String,
    pub total_assets: Option<String>,
    pub short_long_term_debt_total: Option<String>,
    pub long_term_debt: Option<String>,
}

impl BalanceReport {
    pub fn total_debt(&self) -> Option<f64> {
        parse_number(self.short_long_term_debt_total.as_deref())
            .or_else(|| parse_number(self.long_term_debt.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    #[serde(default)]
    pub annual_reports: Vec<BalanceReport>,
    #[serde(default)]
    pub quarterly_reports: Vec<BalanceReport>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    pub fiscal_date_ending: String,
    pub operating_cashflow: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowStatement {
    #[serde(default)]
    pub annual_reports: Vec<CashFlowReport>,
    #[serde(default)]
    pub quarterly_reports: Vec<CashFlowReport>,
}

/// Whatever statement data could be fetched for one symbol.
#[derive(Debug, Clone, Default)]
pub struct FinancialBundle {
    pub overview: Option<CompanyOverview>,
    pub income_statement: Option<IncomeStatement>,
    pub balance_sheet: Option<BalanceSheet>,
    pub cash_flow: Option<CashFlowStatement>,
}

impl FinancialBundle {
    pub fn is_empty(&self) -> bool {
        self.overview.is_none()
            && self.income_statement.is_none()
            && self.balance_sheet.is_none()
            && self.cash_flow.is_none()
    }
}

#[async_trait]
pub trait FinancialDataProvider: Send + Sync {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, DataProviderError>;

    async fn income_statement(&self, symbol: &str) -> Result<IncomeStatement, DataProviderError>;

    async fn balance_sheet(&self, symbol: &str) -> Result<BalanceSheet, DataProviderError>;

    async fn cash_flow(&self, symbol: &str) -> Result<CashFlowStatement, DataProviderError>;

    /// Latest ~100 daily closes, ascending by date.
    async fn daily_series(&self, symbol: &str) -> Result<Vec<ExternalPricePoint>, DataProviderError>;
}
