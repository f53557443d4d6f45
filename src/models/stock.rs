use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// A listed company as cached from the financial-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Stock {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub roe: Option<f64>,
    pub current_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields observed in one provider payload.
///
/// `None` means the payload did not carry the field; `Some(0.0)` is a real value
/// and overwrites whatever was stored before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockSnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub roe: Option<f64>,
    pub current_price: Option<f64>,
}

impl StockSnapshot {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            ..Default::default()
        }
    }
}

impl Stock {
    pub fn from_snapshot(snapshot: StockSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: snapshot.symbol.to_uppercase(),
            name: snapshot.name.unwrap_or_default(),
            sector: snapshot.sector,
            industry: snapshot.industry,
            market_cap: snapshot.market_cap,
            pe_ratio: snapshot.pe_ratio,
            pb_ratio: snapshot.pb_ratio,
            dividend_yield: snapshot.dividend_yield,
            debt_to_equity: snapshot.debt_to_equity,
            roe: snapshot.roe,
            current_price: snapshot.current_price,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Present-wins merge: fields carried by the snapshot replace stored values,
    /// absent fields keep them.
    pub fn apply_snapshot(&mut self, snapshot: &StockSnapshot) {
        if let Some(name) = snapshot.name.as_ref().filter(|n| !n.trim().is_empty()) {
            self.name = name.clone();
        }
        self.sector = snapshot.sector.clone().or(self.sector.take());
        self.industry = snapshot.industry.clone().or(self.industry.take());
        self.market_cap = snapshot.market_cap.or(self.market_cap);
        self.pe_ratio = snapshot.pe_ratio.or(self.pe_ratio);
        self.pb_ratio = snapshot.pb_ratio.or(self.pb_ratio);
        self.dividend_yield = snapshot.dividend_yield.or(self.dividend_yield);
        self.debt_to_equity = snapshot.debt_to_equity.or(self.debt_to_equity);
        self.roe = snapshot.roe.or(self.roe);
        self.current_price = snapshot.current_price.or(self.current_price);
        self.updated_at = Some(Utc::now());
    }
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub stocks: Vec<Stock>,
}
