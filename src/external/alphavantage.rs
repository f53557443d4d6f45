use crate::external::data_provider::{
    BalanceSheet, CashFlowStatement, CompanyOverview, DataProviderError, ExternalPricePoint,
    FinancialDataProvider, IncomeStatement,
};
use crate::services::rate_limiter::RateLimiter;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AlphaVantageClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl AlphaVantageClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, DataProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DataProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            limiter,
        })
    }

    async fn query(
        &self,
        function: &str,
        symbol: &str,
        extra: &[(&str, &str)],
    ) -> Result<Value, DataProviderError> {
        let waited = self.limiter.acquire().await;
        if !waited.is_zero() {
            info!("⏳ Waited {:.1}s for rate limit before {} {}", waited.as_secs_f64(), function, symbol);
        }

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .query(extra)
            .send()
            .await
            .map_err(|e| {
                error!("Request failed for {} {}: {}", function, symbol, e);
                DataProviderError::Network(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| DataProviderError::Network(e.to_string()))?;

        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| DataProviderError::Parse(e.to_string()))?;

        check_payload(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, function: &str, symbol: &str) -> Result<T, DataProviderError> {
        let body = self.query(function, symbol, &[]).await?;
        serde_json::from_value(body).map_err(|e| DataProviderError::Parse(e.to_string()))
    }
}

/// Alpha Vantage reports errors and throttling inside a 200 response.
fn check_payload(body: Value) -> Result<Value, DataProviderError> {
    let Value::Object(map) = body else {
        return Err(DataProviderError::Parse("expected a JSON object".into()));
    };

    if let Some(msg) = map.get("Error Message") {
        error!("API Error: {}", msg);
        return Err(DataProviderError::Api(msg.as_str().unwrap_or_default().to_string()));
    }

    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    // Newer responses use "Information" for the same throttle message.
    if let Some(note) = map.get("Note").or_else(|| map.get("Information")) {
        warn!("API Note: {}", note);
        return Err(DataProviderError::RateLimited(note.as_str().unwrap_or_default().to_string()));
    }

    // Unknown symbols come back as {}
    if map.is_empty() {
        return Err(DataProviderError::Empty);
    }

    Ok(Value::Object(map))
}

#[derive(Debug, Deserialize)]
struct AvDailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, AvDailyBar>>,
}

#[derive(Debug, Deserialize)]
struct AvDailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

#[async_trait]
impl FinancialDataProvider for AlphaVantageClient {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, DataProviderError> {
        self.fetch("OVERVIEW", symbol).await
    }

    async fn income_statement(&self, symbol: &str) -> Result<IncomeStatement, DataProviderError> {
        self.fetch("INCOME_STATEMENT", symbol).await
    }

    async fn balance_sheet(&self, symbol: &str) -> Result<BalanceSheet, DataProviderError> {
        self.fetch("BALANCE_SHEET", symbol).await
    }

    async fn cash_flow(&self, symbol: &str) -> Result<CashFlowStatement, DataProviderError> {
        self.fetch("CASH_FLOW", symbol).await
    }

    async fn daily_series(&self, symbol: &str) -> Result<Vec<ExternalPricePoint>, DataProviderError> {
        // compact = latest 100 points
        let body = self
            .query("TIME_SERIES_DAILY", symbol, &[("outputsize", "compact")])
            .await?;

        let parsed: AvDailyResponse =
            serde_json::from_value(body).map_err(|e| DataProviderError::Parse(e.to_string()))?;

        let series = parsed
            .time_series
            .ok_or_else(|| DataProviderError::Api("missing time series".into()))?;

        // BTreeMap keys are "YYYY-MM-DD", so iteration is already ascending
        series
            .into_iter()
            .map(|(date_str, bar)| {
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                    .map_err(|e| DataProviderError::Parse(e.to_string()))?;
                let close = bar
                    .close
                    .parse::<f64>()
                    .map_err(|e| DataProviderError::Parse(e.to_string()))?;
                Ok(ExternalPricePoint { date, close })
            })
            .collect()
    }
}
