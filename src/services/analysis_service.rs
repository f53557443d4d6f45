use std::collections::BTreeMap;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::data_provider::{
    parse_number, CompanyOverview, FinancialBundle, FinancialDataProvider,
};
use crate::models::{AiAnalysis, FinancialData, RedFlag, RiskEntry, Severity, Stock};
use crate::store::Store;

const MAX_FINANCIAL_YEARS: usize = 5;

const PE_RATIO_LIMIT: f64 = 50.0;
const DEBT_TO_EQUITY_LIMIT: f64 = 2.0;

/// Qualitative part of an analysis, produced by an [`AnalysisStrategy`].
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub executive_summary: String,
    pub sentiment_score: f64,
    pub sentiment_highlights: Vec<String>,
    pub risk_assessment: Vec<RiskEntry>,
}

/// Turns a stock and whatever statements were fetched into an assessment.
///
/// Implementations must not persist anything; the service owns storage.
pub trait AnalysisStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn assess(&self, stock: &Stock, bundle: &FinancialBundle) -> Assessment;
}

/// Fixed-output stand-in until a real scoring model is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderStrategy;

impl AnalysisStrategy for PlaceholderStrategy {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn assess(&self, stock: &Stock, _bundle: &FinancialBundle) -> Assessment {
        let sector = stock.sector.as_deref().unwrap_or("unknown");
        Assessment {
            executive_summary: format!(
                "{} ({}) shows mixed financial performance in the latest reporting period. \
                 The company operates in the {} sector and has demonstrated resilience in key metrics. \
                 Revenue trends and operational efficiency metrics suggest a stable business model, \
                 though market conditions present both opportunities and challenges for future growth.",
                stock.name, stock.symbol, sector
            ),
            sentiment_score: 0.2,
            sentiment_highlights: vec![
                "Management expressed confidence in long-term growth prospects".to_string(),
                "Strong operational efficiency improvements noted".to_string(),
                "Cautious outlook due to market uncertainties".to_string(),
            ],
            risk_assessment: vec![
                RiskEntry {
                    category: "Market Risk".to_string(),
                    description: "Exposure to economic downturns and market volatility".to_string(),
                    severity: Severity::Medium,
                },
                RiskEntry {
                    category: "Operational Risk".to_string(),
                    description: "Supply chain disruptions and cost inflation pressures".to_string(),
                    severity: Severity::Medium,
                },
                RiskEntry {
                    category: "Regulatory Risk".to_string(),
                    description: "Potential changes in industry regulations".to_string(),
                    severity: Severity::Low,
                },
            ],
        }
    }
}

/// Fixed threshold checks against the company overview. Each check is skipped
/// when its metric is unavailable.
pub fn identify_red_flags(overview: Option<&CompanyOverview>) -> Vec<RedFlag> {
    let Some(overview) = overview else {
        return Vec::new();
    };
    let mut flags = Vec::new();

    if let Some(pe) = overview.pe_ratio() {
        if pe > PE_RATIO_LIMIT {
            flags.push(RedFlag {
                category: "Valuation Risk".to_string(),
                description: format!("Very high P/E ratio of {}, potentially overvalued", pe),
            });
        }
    }

    if let Some(de) = overview.debt_to_equity() {
        if de > DEBT_TO_EQUITY_LIMIT {
            flags.push(RedFlag {
                category: "Financial Risk".to_string(),
                description: format!("High debt-to-equity ratio of {}", de),
            });
        }
    }

    if let Some(margin) = overview.profit_margin() {
        if margin < 0.0 {
            flags.push(RedFlag {
                category: "Profitability Risk".to_string(),
                description: "Negative profit margins indicate losses".to_string(),
            });
        }
    }

    flags
}

/// Fetch the four statement categories. Individual failures are logged and
/// leave the corresponding slot empty.
pub async fn fetch_bundle(provider: &dyn FinancialDataProvider, symbol: &str) -> FinancialBundle {
    let overview = provider
        .company_overview(symbol)
        .await
        .map_err(|e| warn!("Overview fetch failed for {}: {}", symbol, e))
        .ok();
    let income_statement = provider
        .income_statement(symbol)
        .await
        .map_err(|e| warn!("Income statement fetch failed for {}: {}", symbol, e))
        .ok();
    let balance_sheet = provider
        .balance_sheet(symbol)
        .await
        .map_err(|e| warn!("Balance sheet fetch failed for {}: {}", symbol, e))
        .ok();
    let cash_flow = provider
        .cash_flow(symbol)
        .await
        .map_err(|e| warn!("Cash flow fetch failed for {}: {}", symbol, e))
        .ok();

    FinancialBundle { overview, income_statement, balance_sheet, cash_flow }
}

fn fiscal_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

/// Merge annual reports of all statements by fiscal year, newest first.
pub fn financial_rows(stock_id: Uuid, bundle: &FinancialBundle) -> Vec<FinancialData> {
    let mut years: BTreeMap<i32, FinancialData> = BTreeMap::new();

    if let Some(income) = &bundle.income_statement {
        for report in &income.annual_reports {
            if let Some(entry) = year_entry(&mut years, stock_id, &report.fiscal_date_ending) {
                entry.revenue = parse_number(report.total_revenue.as_deref());
                entry.net_income = parse_number(report.net_income.as_deref());
            }
        }
    }
    if let Some(balance) = &bundle.balance_sheet {
        for report in &balance.annual_reports {
            if let Some(entry) = year_entry(&mut years, stock_id, &report.fiscal_date_ending) {
                entry.total_assets = parse_number(report.total_assets.as_deref());
                entry.total_debt = report.total_debt();
            }
        }
    }
    if let Some(cash_flow) = &bundle.cash_flow {
        for report in &cash_flow.annual_reports {
            if let Some(entry) = year_entry(&mut years, stock_id, &report.fiscal_date_ending) {
                entry.cash_flow_from_operations = parse_number(report.operating_cashflow.as_deref());
            }
        }
    }

    years.into_values().rev().take(MAX_FINANCIAL_YEARS).collect()
}

fn year_entry<'a>(
    years: &'a mut BTreeMap<i32, FinancialData>,
    stock_id: Uuid,
    fiscal_date_ending: &str,
) -> Option<&'a mut FinancialData> {
    let year = fiscal_year(fiscal_date_ending)?;
    Some(years.entry(year).or_insert_with(|| FinancialData::annual(stock_id, year)))
}

/// Fetch statements, run the strategy and red-flag rules, and persist one new
/// analysis row followed by the merged annual financials.
///
/// Fails without writing anything when no upstream data could be obtained or
/// the analysis row cannot be stored.
pub async fn generate(
    store: &dyn Store,
    provider: &dyn FinancialDataProvider,
    strategy: &dyn AnalysisStrategy,
    stock: &Stock,
) -> Result<AiAnalysis, AppError> {
    info!("Generating analysis for {} using {} strategy", stock.symbol, strategy.name());

    let bundle = fetch_bundle(provider, &stock.symbol).await;
    if bundle.is_empty() {
        error!("No financial data available for {}", stock.symbol);
        return Err(AppError::External(format!(
            "Unable to fetch financial data for {}. Please try again later.",
            stock.symbol
        )));
    }

    let assessment = strategy.assess(stock, &bundle);
    let red_flags = identify_red_flags(bundle.overview.as_ref());

    let analysis = AiAnalysis::new(
        stock.id,
        assessment.executive_summary,
        assessment.sentiment_score,
        assessment.sentiment_highlights,
        assessment.risk_assessment,
        red_flags,
    );
    let saved = store.insert_analysis(&analysis).await.map_err(|e| {
        error!("Failed to store analysis for {}: {}", stock.symbol, e);
        AppError::Db(e)
    })?;

    // financial rows only follow a stored analysis; losing them is logged, not fatal
    let rows = financial_rows(stock.id, &bundle);
    if !rows.is_empty() {
        match store.insert_financial_data(&rows).await {
            Ok(inserted) => info!("Stored {} years of financial data for {}", inserted, stock.symbol),
            Err(e) => warn!("Failed to store financial data for {}: {}", stock.symbol, e),
        }
    }

    info!("✓ Analysis stored for {} ({} red flags)", stock.symbol, saved.red_flags.0.len());
    Ok(saved)
}

pub async fn latest(store: &dyn Store, stock_id: Uuid) -> Result<Option<AiAnalysis>, AppError> {
    Ok(store.latest_analysis(stock_id).await?)
}

pub async fn history(store: &dyn Store, stock_id: Uuid) -> Result<Vec<AiAnalysis>, AppError> {
    Ok(store.list_analyses(stock_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::data_provider::{
        BalanceReport, BalanceSheet, CashFlowReport, CashFlowStatement, IncomeReport, IncomeStatement,
    };
    use crate::models::StockSnapshot;
    use crate::store::MemoryStore;
    use crate::test_support::{overview, FaultyStore, StubProvider};
    use chrono::{Duration, Utc};

    async fn cached(store: &MemoryStore, symbol: &str) -> Stock {
        let mut snapshot = StockSnapshot::new(symbol);
        snapshot.name = Some(format!("{symbol} Inc"));
        snapshot.sector = Some("Technology".into());
        store.upsert_stock(&snapshot).await.unwrap()
    }

    #[test]
    fn test_red_flag_rules() {
        let mut ov = overview("X", "Tech", Some("65.5"));
        ov.debt_to_equity_ratio = Some("2.5".into());
        ov.profit_margin = Some("-0.1".into());

        let flags = identify_red_flags(Some(&ov));
        let categories: Vec<&str> = flags.iter().map(|f| f.category.as_str()).collect();

        assert_eq!(categories, vec!["Valuation Risk", "Financial Risk", "Profitability Risk"]);
        assert_eq!(flags[0].description, "Very high P/E ratio of 65.5, potentially overvalued");
    }

    #[test]
    fn test_red_flag_thresholds_are_strict() {
        let mut ov = overview("X", "Tech", Some("50"));
        ov.debt_to_equity_ratio = Some("2.0".into());
        ov.profit_margin = Some("0".into());

        assert!(identify_red_flags(Some(&ov)).is_empty());
        assert!(identify_red_flags(None).is_empty());
    }

    #[test]
    fn test_financial_rows_merge_by_year_and_keep_latest_five() {
        let stock_id = Uuid::new_v4();
        let years = 2016..=2023;
        let bundle = FinancialBundle {
            overview: None,
            income_statement: Some(IncomeStatement {
                annual_reports: years
                    .clone()
                    .map(|y| IncomeReport {
                        fiscal_date_ending: format!("{y}-12-31"),
                        total_revenue: Some(format!("{}", y * 10)),
                        net_income: Some("None".into()),
                    })
                    .collect(),
                quarterly_reports: vec![],
            }),
            balance_sheet: Some(BalanceSheet {
                annual_reports: vec![BalanceReport {
                    fiscal_date_ending: "2023-12-31".into(),
                    total_assets: Some("900".into()),
                    short_long_term_debt_total: None,
                    long_term_debt: Some("300".into()),
                }],
                quarterly_reports: vec![],
            }),
            cash_flow: Some(CashFlowStatement {
                annual_reports: vec![CashFlowReport {
                    fiscal_date_ending: "2023-12-31".into(),
                    operating_cashflow: Some("120".into()),
                }],
                quarterly_reports: vec![],
            }),
        };

        let rows = financial_rows(stock_id, &bundle);

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].fiscal_year, 2023);
        assert_eq!(rows[4].fiscal_year, 2019);
        assert_eq!(rows[0].revenue, Some(20230.0));
        assert_eq!(rows[0].net_income, None);
        assert_eq!(rows[0].total_assets, Some(900.0));
        assert_eq!(rows[0].total_debt, Some(300.0));
        assert_eq!(rows[0].cash_flow_from_operations, Some(120.0));
        assert!(rows.iter().all(|r| r.fiscal_quarter.is_none()));
    }

    #[tokio::test]
    async fn test_generation_fails_without_any_upstream_data() {
        let store = MemoryStore::new();
        let stock = cached(&store, "GHOST").await;
        let provider = StubProvider::new();

        let err = generate(&store, &provider, &PlaceholderStrategy, &stock).await.unwrap_err();

        assert!(matches!(err, AppError::External(_)));
        assert!(latest(&store, stock.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generation_without_pe_skips_valuation_flag() {
        let store = MemoryStore::new();
        let stock = cached(&store, "IBM").await;
        let mut ov = overview("IBM", "Technology", None);
        ov.debt_to_equity_ratio = Some("3.1".into());
        let provider = StubProvider::new().with_overview(ov);

        let analysis = generate(&store, &provider, &PlaceholderStrategy, &stock).await.unwrap();

        let categories: Vec<&str> = analysis.red_flags.0.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(categories, vec!["Financial Risk"]);
        assert_eq!(analysis.sentiment_score, 0.2);
        assert_eq!(analysis.sentiment_highlights.0.len(), 3);
        assert_eq!(analysis.risk_assessment.0.len(), 3);
        assert!(analysis.executive_summary.contains("IBM Inc (IBM)"));
    }

    #[tokio::test]
    async fn test_generation_stores_annual_financials() {
        let store = MemoryStore::new();
        let stock = cached(&store, "IBM").await;
        let report = |year: i32| IncomeReport {
            fiscal_date_ending: format!("{year}-12-31"),
            total_revenue: Some("61860000000".into()),
            net_income: Some("7502000000".into()),
        };
        let provider = StubProvider::new()
            .with_income(
                "IBM",
                IncomeStatement { annual_reports: vec![report(2023), report(2022)], quarterly_reports: vec![] },
            )
            .with_balance(
                "IBM",
                BalanceSheet {
                    annual_reports: vec![BalanceReport {
                        fiscal_date_ending: "2023-12-31".into(),
                        total_assets: Some("135241000000".into()),
                        short_long_term_debt_total: Some("56548000000".into()),
                        long_term_debt: None,
                    }],
                    quarterly_reports: vec![],
                },
            )
            .with_cash_flow("IBM", CashFlowStatement::default());

        let analysis = generate(&store, &provider, &PlaceholderStrategy, &stock).await.unwrap();

        // no overview, so no red flags can be evaluated
        assert!(analysis.red_flags.0.is_empty());
        let rows = store.list_financial_data(stock.id).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.fiscal_year).collect::<Vec<_>>(), vec![2023, 2022]);
        assert_eq!(rows[0].total_debt, Some(56548000000.0));
        assert_eq!(rows[1].total_assets, None);
    }

    #[tokio::test]
    async fn test_failed_analysis_insert_leaves_no_financials() {
        let store = MemoryStore::new();
        let stock = cached(&store, "IBM").await;
        let provider = StubProvider::new().with_income(
            "IBM",
            IncomeStatement {
                annual_reports: vec![IncomeReport {
                    fiscal_date_ending: "2023-12-31".into(),
                    total_revenue: Some("61860000000".into()),
                    net_income: None,
                }],
                quarterly_reports: vec![],
            },
        );
        let faulty = FaultyStore::new(&store).rejecting_analyses();

        let err = generate(&faulty, &provider, &PlaceholderStrategy, &stock).await.unwrap_err();

        assert!(matches!(err, AppError::Db(_)));
        assert!(store.list_financial_data(stock.id).await.unwrap().is_empty());
        assert!(history(&store, stock.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_appends_history() {
        let store = MemoryStore::new();
        let stock = cached(&store, "IBM").await;
        let provider = StubProvider::new().with_overview(overview("IBM", "Technology", Some("20")));

        generate(&store, &provider, &PlaceholderStrategy, &stock).await.unwrap();
        generate(&store, &provider, &PlaceholderStrategy, &stock).await.unwrap();

        assert_eq!(history(&store, stock.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_latest_is_newest_by_timestamp() {
        let store = MemoryStore::new();
        let stock_id = cached(&store, "IBM").await.id;
        let now = Utc::now();

        let mut newest = AiAnalysis::new(stock_id, "newest".into(), 0.1, vec![], vec![], vec![]);
        newest.analysis_date = now;
        let mut older = AiAnalysis::new(stock_id, "older".into(), 0.1, vec![], vec![], vec![]);
        older.analysis_date = now - Duration::hours(2);
        let mut middle = AiAnalysis::new(stock_id, "middle".into(), 0.1, vec![], vec![], vec![]);
        middle.analysis_date = now - Duration::hours(1);

        // insertion order deliberately differs from timestamp order
        for row in [&newest, &older, &middle] {
            store.insert_analysis(row).await.unwrap();
        }

        let found = latest(&store, stock_id).await.unwrap().unwrap();
        assert_eq!(found.executive_summary, "newest");
    }

    struct Gloomy;

    impl AnalysisStrategy for Gloomy {
        fn name(&self) -> &'static str {
            "gloomy"
        }

        fn assess(&self, _stock: &Stock, _bundle: &FinancialBundle) -> Assessment {
            Assessment {
                executive_summary: "bad".into(),
                sentiment_score: -7.0,
                sentiment_highlights: vec![],
                risk_assessment: vec![],
            }
        }
    }

    #[tokio::test]
    async fn test_strategy_is_pluggable_and_sentiment_clamped() {
        let store = MemoryStore::new();
        let stock = cached(&store, "IBM").await;
        let provider = StubProvider::new().with_overview(overview("IBM", "Technology", Some("20")));

        let analysis = generate(&store, &provider, &Gloomy, &stock).await.unwrap();

        assert_eq!(analysis.executive_summary, "bad");
        assert_eq!(analysis.sentiment_score, -1.0);
    }
}
