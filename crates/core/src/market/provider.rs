use crate::domain::market::{CompanyInfo, PricePoint, SearchMatch, StockQuote};
use anyhow::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSize {
    /// Roughly the last 100 sessions.
    #[default]
    Compact,
    /// Full multi-decade history.
    Full,
}

impl OutputSize {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Notices the provider embeds in an otherwise successful HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketDataError {
    RateLimited(String),
    Provider(String),
}

impl fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketDataError::RateLimited(msg) => write!(f, "market data rate limit: {msg}"),
            MarketDataError::Provider(msg) => write!(f, "market data provider error: {msg}"),
        }
    }
}

impl std::error::Error for MarketDataError {}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn search_symbols(&self, query: &str) -> Result<Vec<SearchMatch>>;

    /// `Ok(None)` when the provider knows no such symbol.
    async fn quote(&self, symbol: &str) -> Result<Option<StockQuote>>;

    /// Daily bars, oldest first, one per date.
    async fn daily_history(&self, symbol: &str, size: OutputSize) -> Result<Vec<PricePoint>>;

    async fn company_overview(&self, symbol: &str) -> Result<Option<CompanyInfo>>;
}
