use crate::analysis::metrics::PriceSummary;
use crate::domain::market::CompanyInfo;

const TREND_POINTS: usize = 10;
const UNKNOWN: &str = "Unknown";

pub fn build_prompt(
    symbol: &str,
    current_price: f64,
    summary: &PriceSummary,
    company: Option<&CompanyInfo>,
) -> String {
    let name = or_unknown(company.and_then(|c| c.name.as_deref()));
    let sector = or_unknown(company.and_then(|c| c.sector.as_deref()));
    let market_cap = or_unknown(company.and_then(|c| c.market_capitalization.as_deref()));

    let start = summary.recent_closes.len().saturating_sub(TREND_POINTS);
    let trend = summary.recent_closes[start..]
        .iter()
        .map(|p| format!("{p:.2}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyze the stock {symbol} for investment purposes. Here's the data:\n\
\n\
Current Price: ${current_price}\n\
30-Day Price Change: {change:.2}%\n\
30-Day Volatility: {volatility:.2}%\n\
Company: {name}\n\
Sector: {sector}\n\
Market Cap: {market_cap}\n\
\n\
Recent price trend (last {TREND_POINTS} days): {trend}\n\
\n\
Based on this data, provide:\n\
1. Investment recommendation (BUY/HOLD/SELL)\n\
2. Confidence level (0-100)\n\
3. Risk assessment (LOW/MEDIUM/HIGH)\n\
4. 3-5 key points for investors\n\
5. Brief analysis (2-3 paragraphs)\n\
\n\
Format your response as JSON with keys: recommendation, confidence, riskLevel, keyPoints (array), analysis (string).\n\
Do NOT include any personal data or make guarantees about future performance. This is for educational purposes only.",
        change = summary.price_change_30d,
        volatility = summary.volatility,
    )
}

fn or_unknown(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
}
