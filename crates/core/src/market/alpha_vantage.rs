use crate::config::Settings;
use crate::domain::market::{CompanyInfo, PricePoint, SearchMatch, StockQuote};
use crate::market::provider::{MarketDataError, MarketDataProvider, OutputSize};
use crate::market::throttle::RequestThrottle;
use crate::market::types::{DailySeriesResponse, GlobalQuoteResponse, SymbolSearchResponse};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const QUERY_PATH: &str = "/query";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    throttle: Arc<RequestThrottle>,
}

impl AlphaVantageClient {
    /// Uses the process-wide throttle so every client in the process shares
    /// one request budget.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_alpha_vantage_api_key()?.to_string();
        let base_url = std::env::var("ALPHA_VANTAGE_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("ALPHA_VANTAGE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            throttle: RequestThrottle::shared(),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), QUERY_PATH)
    }

    async fn query(&self, function: &'static str, params: &[(&str, &str)]) -> Result<Value> {
        let permit = self.throttle.acquire().await;
        if !permit.waited.is_zero() {
            tracing::debug!(function, waited = ?permit.waited, "throttled market data request");
        }

        let mut query: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
        query.push(("function", function));
        query.extend_from_slice(params);
        query.push(("apikey", self.api_key.as_str()));

        let res = self
            .http
            .get(self.url())
            .query(&query)
            .send()
            .await
            .with_context(|| format!("market data request failed (function={function})"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        if !status.is_success() {
            anyhow::bail!("market data HTTP {status} (function={function}): {text}");
        }

        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("market data response is not valid JSON: {text}"))?;
        if let Err(notice) = check_notice(&raw_json) {
            tracing::warn!(function, error = %notice, "market data provider notice");
            return Err(notice.into());
        }
        Ok(raw_json)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn search_symbols(&self, query: &str) -> Result<Vec<SearchMatch>> {
        let raw = self.query("SYMBOL_SEARCH", &[("keywords", query)]).await?;
        parse_search(raw)
    }

    async fn quote(&self, symbol: &str) -> Result<Option<StockQuote>> {
        let symbol = symbol.to_uppercase();
        let raw = self.query("GLOBAL_QUOTE", &[("symbol", symbol.as_str())]).await?;
        parse_quote(raw)
    }

    async fn daily_history(&self, symbol: &str, size: OutputSize) -> Result<Vec<PricePoint>> {
        let symbol = symbol.to_uppercase();
        let raw = self
            .query(
                "TIME_SERIES_DAILY",
                &[("symbol", symbol.as_str()), ("outputsize", size.as_str())],
            )
            .await?;
        parse_daily(raw)
    }

    async fn company_overview(&self, symbol: &str) -> Result<Option<CompanyInfo>> {
        let symbol = symbol.to_uppercase();
        let raw = self.query("OVERVIEW", &[("symbol", symbol.as_str())]).await?;
        parse_overview(raw)
    }
}

/// Rate-limit and error notices arrive with HTTP 200.
fn check_notice(raw: &Value) -> std::result::Result<(), MarketDataError> {
    for key in ["Information", "Note"] {
        if let Some(msg) = raw.get(key).and_then(Value::as_str) {
            return Err(MarketDataError::RateLimited(msg.to_string()));
        }
    }
    if let Some(msg) = raw.get("Error Message").and_then(Value::as_str) {
        return Err(MarketDataError::Provider(msg.to_string()));
    }
    Ok(())
}

fn parse_search(raw: Value) -> Result<Vec<SearchMatch>> {
    let parsed = serde_json::from_value::<SymbolSearchResponse>(raw)
        .context("failed to parse SYMBOL_SEARCH response")?;
    Ok(parsed
        .best_matches
        .into_iter()
        .map(|m| SearchMatch {
            symbol: m.symbol,
            name: m.name,
            kind: m.kind,
            region: m.region,
        })
        .collect())
}

fn parse_quote(raw: Value) -> Result<Option<StockQuote>> {
    let parsed = serde_json::from_value::<GlobalQuoteResponse>(raw)
        .context("failed to parse GLOBAL_QUOTE response")?;
    let Some(q) = parsed.quote.filter(|q| !q.symbol.trim().is_empty()) else {
        return Ok(None);
    };

    let current_price = parse_num(&q.price).context("quote is missing price")?;
    Ok(Some(StockQuote {
        symbol: q.symbol,
        current_price,
        change: parse_num(&q.change).unwrap_or(0.0),
        change_percent: parse_num(q.change_percent.trim().trim_end_matches('%')).unwrap_or(0.0),
        volume: parse_volume(&q.volume).unwrap_or(0),
        previous_close: parse_num(&q.previous_close).unwrap_or(0.0),
    }))
}

fn parse_daily(raw: Value) -> Result<Vec<PricePoint>> {
    let parsed = serde_json::from_value::<DailySeriesResponse>(raw)
        .context("failed to parse TIME_SERIES_DAILY response")?;
    let Some(series) = parsed.series else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(series.len());
    for (date, bar) in series {
        let point = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|date| {
                Some(PricePoint {
                    date,
                    open: parse_num(&bar.open)?,
                    high: parse_num(&bar.high)?,
                    low: parse_num(&bar.low)?,
                    close: parse_num(&bar.close)?,
                    volume: parse_volume(&bar.volume)?,
                })
            });
        match point {
            Some(p) => out.push(p),
            None => tracing::warn!(%date, "skipping unparseable daily bar"),
        }
    }

    // Keys are sorted as strings; re-sort on the parsed date and drop repeats.
    out.sort_by_key(|p| p.date);
    out.dedup_by_key(|p| p.date);
    Ok(out)
}

fn parse_overview(raw: Value) -> Result<Option<CompanyInfo>> {
    let is_empty = raw.as_object().map(|o| o.is_empty()).unwrap_or(true);
    if is_empty {
        return Ok(None);
    }
    let info = serde_json::from_value::<CompanyInfo>(raw)
        .context("failed to parse OVERVIEW response")?;
    if info == CompanyInfo::default() {
        return Ok(None);
    }
    Ok(Some(info))
}

fn parse_num(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_volume(s: &str) -> Option<u64> {
    let t = s.trim();
    t.parse::<u64>()
        .ok()
        .or_else(|| parse_num(t).filter(|v| *v >= 0.0).map(|v| v as u64))
}
