use serde::{Deserialize, Serialize};

use crate::models::Stock;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// POST body for the screening endpoint.
///
/// Every bound is optional. Supplied bounds are combined with AND; a stock whose
/// metric is NULL never satisfies a bound on that metric.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScreeningFilters {
    pub min_market_cap: Option<f64>,
    pub max_market_cap: Option<f64>,
    pub min_pe_ratio: Option<f64>,
    pub max_pe_ratio: Option<f64>,
    pub min_pb_ratio: Option<f64>,
    pub max_pb_ratio: Option<f64>,
    pub min_dividend_yield: Option<f64>,
    pub max_dividend_yield: Option<f64>,
    pub min_debt_to_equity: Option<f64>,
    pub max_debt_to_equity: Option<f64>,
    pub min_roe: Option<f64>,
    pub max_roe: Option<f64>,

    /// Only include these sectors. Missing or empty means any sector.
    pub sectors: Option<Vec<String>>,
}

/// Numeric stock columns that can be bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    MarketCap,
    PeRatio,
    PbRatio,
    DividendYield,
    DebtToEquity,
    Roe,
}

impl Metric {
    pub fn column(self) -> &'static str {
        match self {
            Metric::MarketCap => "market_cap",
            Metric::PeRatio => "pe_ratio",
            Metric::PbRatio => "pb_ratio",
            Metric::DividendYield => "dividend_yield",
            Metric::DebtToEquity => "debt_to_equity",
            Metric::Roe => "roe",
        }
    }

    pub fn value(self, stock: &Stock) -> Option<f64> {
        match self {
            Metric::MarketCap => stock.market_cap,
            Metric::PeRatio => stock.pe_ratio,
            Metric::PbRatio => stock.pb_ratio,
            Metric::DividendYield => stock.dividend_yield,
            Metric::DebtToEquity => stock.debt_to_equity,
            Metric::Roe => stock.roe,
        }
    }
}

/// Inclusive range on one metric; either end may be open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub metric: Metric,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bound {
    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn admits(&self, value: Option<f64>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(v) = value else {
            return false;
        };
        self.min.map_or(true, |min| v >= min) && self.max.map_or(true, |max| v <= max)
    }
}

impl ScreeningFilters {
    /// Bounds that actually constrain something.
    pub fn bounds(&self) -> Vec<Bound> {
        [
            (Metric::MarketCap, self.min_market_cap, self.max_market_cap),
            (Metric::PeRatio, self.min_pe_ratio, self.max_pe_ratio),
            (Metric::PbRatio, self.min_pb_ratio, self.max_pb_ratio),
            (Metric::DividendYield, self.min_dividend_yield, self.max_dividend_yield),
            (Metric::DebtToEquity, self.min_debt_to_equity, self.max_debt_to_equity),
            (Metric::Roe, self.min_roe, self.max_roe),
        ]
        .into_iter()
        .map(|(metric, min, max)| Bound { metric, min, max })
        .filter(|b| !b.is_open())
        .collect()
    }

    pub fn sector_allow_list(&self) -> Option<&[String]> {
        self.sectors.as_deref().filter(|s| !s.is_empty())
    }

    pub fn matches(&self, stock: &Stock) -> bool {
        if let Some(sectors) = self.sector_allow_list() {
            match &stock.sector {
                Some(sector) if sectors.iter().any(|s| s == sector) => {}
                _ => return false,
            }
        }
        self.bounds()
            .iter()
            .all(|bound| bound.admits(bound.metric.value(stock)))
    }

    pub fn validate(&self) -> Result<(), String> {
        let has_nan = self
            .bounds()
            .iter()
            .any(|b| b.min.is_some_and(f64::is_nan) || b.max.is_some_and(f64::is_nan));
        if has_nan {
            return Err("Filter bounds must be numbers".to_string());
        }
        Ok(())
    }
}

/// In-memory evaluation of the filters over a stock collection.
pub fn screen<'a, I>(stocks: I, filters: &ScreeningFilters) -> Vec<Stock>
where
    I: IntoIterator<Item = &'a Stock>,
{
    stocks
        .into_iter()
        .filter(|stock| filters.matches(stock))
        .cloned()
        .collect()
}
