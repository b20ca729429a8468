//! Alpha Vantage wire shapes. Every numeric arrives as a string.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolSearchResponse {
    #[serde(rename = "bestMatches", default)]
    pub best_matches: Vec<SymbolSearchMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolSearchMatch {
    #[serde(rename = "1. symbol")]
    pub symbol: String,
    #[serde(rename = "2. name")]
    pub name: String,
    #[serde(rename = "3. type", default)]
    pub kind: String,
    #[serde(rename = "4. region", default)]
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    pub quote: Option<GlobalQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol", default)]
    pub symbol: String,
    #[serde(rename = "05. price", default)]
    pub price: String,
    #[serde(rename = "06. volume", default)]
    pub volume: String,
    #[serde(rename = "08. previous close", default)]
    pub previous_close: String,
    #[serde(rename = "09. change", default)]
    pub change: String,
    #[serde(rename = "10. change percent", default)]
    pub change_percent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)", default)]
    pub series: Option<BTreeMap<String, DailyBar>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}
