// =============================================================================
// Yahoo Finance Provider — public chart and quoteSummary endpoints
// =============================================================================
//
// Chart:        GET {base}/v8/finance/chart/{symbol}?range={period}&interval=1d
// quoteSummary: GET {base}/v10/finance/quoteSummary/{symbol}?modules=...
//
// Bars missing any of open/high/low/close, or carrying a non-positive price,
// are skipped; a missing volume is recorded as 0.  Bar dates are taken in the
// exchange's local time (`meta.gmtoffset`).  Repeated trading dates keep the
// later bar.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{CompanyInfo, DataProvider, ProviderError};
use crate::types::{Period, PriceBar, PriceSeries};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) equity-scan/1.0";
const SUMMARY_MODULES: &str = "price,assetProfile,summaryDetail,defaultKeyStatistics,financialData";

/// Fundamental fields reported in [`CompanyInfo`], in display order.
pub const COMPANY_FIELDS: [&str; 15] = [
    "longName",
    "sector",
    "industry",
    "marketCap",
    "trailingPE",
    "forwardPE",
    "priceToBook",
    "totalRevenue",
    "revenueGrowth",
    "profitMargins",
    "operatingMargins",
    "dividendYield",
    "payoutRatio",
    "currentRatio",
    "debtToEquity",
];

#[derive(Clone)]
pub struct YahooProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into();
        debug!(base_url = %base_url, "YahooProvider initialised");
        Ok(Self { base_url, client })
    }

    async fn get_text(&self, symbol: &str, url: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("{url} returned {status}")));
        }

        resp.text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }
}

#[async_trait]
impl DataProvider for YahooProvider {
    #[instrument(skip(self), name = "yahoo::fetch_history")]
    async fn fetch_history(&self, symbol: &str, period: Period) -> Result<PriceSeries, ProviderError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url, symbol, period
        );
        let body = self.get_text(symbol, &url).await?;
        let series = parse_chart(symbol, &body)?;
        debug!(bars = series.len(), "history retrieved");
        Ok(series)
    }

    #[instrument(skip(self), name = "yahoo::fetch_company_info")]
    async fn fetch_company_info(&self, symbol: &str) -> Result<CompanyInfo, ProviderError> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.base_url, symbol, SUMMARY_MODULES
        );
        let body = self.get_text(symbol, &url).await?;
        parse_quote_summary(symbol, &body)
    }
}

// =============================================================================
// Chart parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn api_error(symbol: &str, error: ApiError) -> ProviderError {
    if error.code.eq_ignore_ascii_case("Not Found") {
        ProviderError::NotFound {
            symbol: symbol.to_string(),
        }
    } else {
        ProviderError::Malformed(format!(
            "{}: {}",
            error.code,
            error.description.unwrap_or_default()
        ))
    }
}

fn trading_date(ts: i64, gmtoffset: i64) -> Result<NaiveDate, ProviderError> {
    ts.checked_add(gmtoffset)
        .and_then(|local| DateTime::from_timestamp(local, 0))
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ProviderError::Malformed(format!("invalid timestamp {ts}")))
}

/// Parse a chart response body into a validated series.
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries, ProviderError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(error) = response.chart.error {
        return Err(api_error(symbol, error));
    }

    let not_found = || ProviderError::NotFound {
        symbol: symbol.to_string(),
    };
    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(not_found)?;
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let (Some(Some(open)), Some(Some(high)), Some(Some(low)), Some(Some(close))) = (
            quote.open.get(i),
            quote.high.get(i),
            quote.low.get(i),
            quote.close.get(i),
        ) else {
            continue;
        };
        let (open, high, low, close) = (*open, *high, *low, *close);
        if [open, high, low, close].iter().any(|p| !p.is_finite() || *p <= 0.0) {
            debug!(symbol, index = i, open, high, low, close, "skipping bar with invalid price");
            continue;
        }
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .filter(|v| v.is_finite() && *v > 0.0)
            .map_or(0, |v| v as u64);

        let bar = PriceBar {
            date: trading_date(ts, result.meta.gmtoffset)?,
            open,
            high,
            low,
            close,
            volume,
        };
        match bars.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => bars.push(bar),
        }
    }

    if bars.is_empty() {
        return Err(not_found());
    }
    PriceSeries::new(bars).map_err(|e| ProviderError::Malformed(e.to_string()))
}

// =============================================================================
// quoteSummary parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryData,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(default)]
    result: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// Yahoo wraps numbers as `{"raw": 1.2, "fmt": "1.2"}`; plain values pass
/// through.  Empty wrappers count as missing.
fn unwrap_value(value: &serde_json::Value) -> Option<serde_json::Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Object(obj) => obj.get("raw").filter(|v| !v.is_null()).cloned(),
        other => Some(other.clone()),
    }
}

/// Parse a quoteSummary body.  Fields are looked up across every returned
/// module; missing ones are reported as null.
pub fn parse_quote_summary(symbol: &str, body: &str) -> Result<CompanyInfo, ProviderError> {
    let response: SummaryResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(error) = response.quote_summary.error {
        return Err(api_error(symbol, error));
    }

    let modules = response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::NotFound {
            symbol: symbol.to_string(),
        })?;

    let fields = COMPANY_FIELDS
        .iter()
        .map(|name| {
            let value = modules
                .values()
                .filter_map(|module| module.get(*name))
                .find_map(unwrap_value)
                .unwrap_or(serde_json::Value::Null);
            (name.to_string(), value)
        })
        .collect();

    Ok(CompanyInfo {
        symbol: symbol.to_string(),
        fields,
    })
}
