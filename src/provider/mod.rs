// =============================================================================
// Data Provider — source of daily price history and company fundamentals
// =============================================================================

pub mod rate_limit;
pub mod yahoo;

pub use rate_limit::RateLimiter;
pub use yahoo::YahooProvider;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::types::{Period, PriceSeries};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("no data found for {symbol}")]
    NotFound { symbol: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// A symbol that does not exist will not appear on a retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}

/// Fundamental fields in a fixed display order.  Values keep the provider's
/// JSON type (string for names, number for ratios and amounts).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompanyInfo {
    pub symbol: String,
    pub fields: Vec<(String, serde_json::Value)>,
}

impl CompanyInfo {
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch_history(&self, symbol: &str, period: Period) -> Result<PriceSeries, ProviderError>;

    async fn fetch_company_info(&self, symbol: &str) -> Result<CompanyInfo, ProviderError>;
}
