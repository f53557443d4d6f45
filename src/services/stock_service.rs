use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::data_provider::{
    CompanyOverview, DataProviderError, ExternalPricePoint, FinancialDataProvider,
};
use crate::models::{ScreeningFilters, Stock, StockSnapshot};
use crate::store::Store;

/// Upper-cases and sanity-checks a ticker symbol.
pub fn normalize_symbol(symbol: &str) -> Result<String, AppError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Symbol cannot be empty".into()));
    }
    if symbol.len() > 12
        || !symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(AppError::Validation(format!("Invalid symbol: {}", symbol)));
    }
    Ok(symbol)
}

pub fn snapshot_from_overview(symbol: &str, overview: &CompanyOverview) -> StockSnapshot {
    StockSnapshot {
        symbol: symbol.to_uppercase(),
        name: overview.name(),
        sector: overview.sector(),
        industry: overview.industry(),
        market_cap: overview.market_cap(),
        pe_ratio: overview.pe_ratio(),
        pb_ratio: overview.pb_ratio(),
        dividend_yield: overview.dividend_yield(),
        debt_to_equity: overview.debt_to_equity(),
        roe: overview.roe(),
        current_price: overview.price(),
    }
}

pub async fn get_by_symbol(store: &dyn Store, symbol: &str) -> Result<Option<Stock>, AppError> {
    let symbol = normalize_symbol(symbol)?;
    let stock = store.find_stock_by_symbol(&symbol).await.map_err(|e| {
        error!("Failed to look up stock {}: {}", symbol, e);
        AppError::Db(e)
    })?;
    Ok(stock)
}

/// Create or refresh a stock from the provider's OVERVIEW payload.
///
/// Provider failures are logged and reported as `Ok(None)`; only storage
/// errors propagate.
pub async fn upsert_from_provider(
    store: &dyn Store,
    provider: &dyn FinancialDataProvider,
    symbol: &str,
) -> Result<Option<Stock>, AppError> {
    let symbol = normalize_symbol(symbol)?;

    let overview = match provider.company_overview(&symbol).await {
        Ok(overview) => overview,
        Err(e) => {
            match &e {
                DataProviderError::RateLimited(_) => warn!("Rate limited fetching {}", symbol),
                _ => error!("Failed to fetch data for {}: {}", symbol, e),
            }
            return Ok(None);
        }
    };

    let snapshot = snapshot_from_overview(&symbol, &overview);
    let stock = store.upsert_stock(&snapshot).await.map_err(|e| {
        error!("Failed to upsert stock {}: {}", symbol, e);
        AppError::Db(e)
    })?;

    info!("✓ Upserted stock {}", stock.symbol);
    Ok(Some(stock))
}

/// Read-through lookup: cached row if present, otherwise fetch and store.
pub async fn get_or_fetch(
    store: &dyn Store,
    provider: &dyn FinancialDataProvider,
    symbol: &str,
) -> Result<Stock, AppError> {
    if let Some(stock) = get_by_symbol(store, symbol).await? {
        return Ok(stock);
    }
    upsert_from_provider(store, provider, symbol)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock not found".into()))
}

pub async fn list(store: &dyn Store) -> Result<Vec<Stock>, AppError> {
    Ok(store.list_stocks().await?)
}

pub async fn screen(store: &dyn Store, filters: &ScreeningFilters) -> Result<Vec<Stock>, AppError> {
    filters.validate()?;
    let stocks = store.screen_stocks(filters).await.map_err(|e| {
        error!("Failed to screen stocks: {}", e);
        AppError::Db(e)
    })?;
    info!("Screening matched {} stocks", stocks.len());
    Ok(stocks)
}

/// Fetch recent daily closes and record the latest close as the current price
/// of an already cached stock.
pub async fn refresh_price_history(
    store: &dyn Store,
    provider: &dyn FinancialDataProvider,
    symbol: &str,
) -> Result<Vec<ExternalPricePoint>, AppError> {
    let symbol = normalize_symbol(symbol)?;

    let points = provider.daily_series(&symbol).await.map_err(|e| {
        warn!("Failed to fetch daily series for {}: {}", symbol, e);
        match e {
            DataProviderError::RateLimited(_) => AppError::RateLimited,
            DataProviderError::Empty => AppError::NotFound(format!("No price data for {}", symbol)),
            other => AppError::External(other.to_string()),
        }
    })?;

    if let Some(latest) = points.last() {
        if store.find_stock_by_symbol(&symbol).await?.is_some() {
            let mut snapshot = StockSnapshot::new(&symbol);
            snapshot.current_price = Some(latest.close);
            store.upsert_stock(&snapshot).await?;
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::{overview, StubProvider};
    use chrono::NaiveDate;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" brk.b ").unwrap(), "BRK.B");
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("A B").is_err());
        assert!(normalize_symbol("DROP;TABLE").is_err());
    }

    #[tokio::test]
    async fn test_repeated_upserts_keep_single_record() {
        let store = MemoryStore::new();
        let provider = StubProvider::new().with_overview(overview("IBM", "Technology", Some("21.5")));

        for symbol in ["ibm", "IBM", "Ibm"] {
            upsert_from_provider(&store, &provider, symbol).await.unwrap().unwrap();
        }

        let all = store.list_stocks().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].symbol, "IBM");
        assert_eq!(all[0].pe_ratio, Some(21.5));
    }

    #[tokio::test]
    async fn test_update_keeps_fields_missing_from_payload() {
        let store = MemoryStore::new();
        let provider = StubProvider::new().with_overview(overview("IBM", "Technology", Some("21.5")));
        upsert_from_provider(&store, &provider, "IBM").await.unwrap();

        let mut thinner = overview("IBM", "Technology", None);
        thinner.sector = Some("None".into());
        thinner.dividend_yield = Some("0".into());
        provider.set_overview(thinner);

        let stock = upsert_from_provider(&store, &provider, "IBM").await.unwrap().unwrap();

        assert_eq!(stock.pe_ratio, Some(21.5));
        assert_eq!(stock.sector.as_deref(), Some("Technology"));
        // zero is a real value, not "missing"
        assert_eq!(stock.dividend_yield, Some(0.0));
    }

    #[tokio::test]
    async fn test_provider_failure_is_soft() {
        let store = MemoryStore::new();
        let provider = StubProvider::new();

        let result = upsert_from_provider(&store, &provider, "NOPE").await.unwrap();

        assert!(result.is_none());
        assert!(store.list_stocks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches() {
        let store = MemoryStore::new();
        let provider = StubProvider::new().with_overview(overview("MSFT", "Technology", Some("35")));

        get_or_fetch(&store, &provider, "msft").await.unwrap();
        get_or_fetch(&store, &provider, "MSFT").await.unwrap();

        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_unknown_is_not_found() {
        let store = MemoryStore::new();
        let provider = StubProvider::new();

        let err = get_or_fetch(&store, &provider, "ZZZZ").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_price_history_updates_current_price() {
        let store = MemoryStore::new();
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let provider = StubProvider::new()
            .with_overview(overview("IBM", "Technology", Some("21.5")))
            .with_series(
                "IBM",
                vec![
                    ExternalPricePoint { date: day(1), close: 185.0 },
                    ExternalPricePoint { date: day(4), close: 188.25 },
                ],
            );
        get_or_fetch(&store, &provider, "IBM").await.unwrap();

        let points = refresh_price_history(&store, &provider, "IBM").await.unwrap();

        assert_eq!(points.len(), 2);
        let stock = store.find_stock_by_symbol("IBM").await.unwrap().unwrap();
        assert_eq!(stock.current_price, Some(188.25));
        assert_eq!(stock.pe_ratio, Some(21.5));
    }

    #[tokio::test]
    async fn test_price_history_does_not_create_stock() {
        let store = MemoryStore::new();
        let provider = StubProvider::new().with_series(
            "TSLA",
            vec![ExternalPricePoint { date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), close: 200.0 }],
        );

        refresh_price_history(&store, &provider, "TSLA").await.unwrap();

        assert!(store.find_stock_by_symbol("TSLA").await.unwrap().is_none());
    }
}
