use crate::analysis::metrics::{simple_moving_average, PriceSummary};
use crate::domain::analysis::{AnalysisResult, Confidence, Recommendation, RiskLevel};

const SMA_PERIOD: usize = 20;
const TREND_THRESHOLD_PCT: f64 = 5.0;

/// Offline analysis from price, 30-day change and SMA-20 alone. Needs no
/// network access and cannot fail.
pub fn analyze(symbol: &str, current_price: f64, summary: &PriceSummary) -> AnalysisResult {
    let change = summary.price_change_30d;
    let volatility = summary.volatility;
    let sma20 = simple_moving_average(&summary.recent_closes, SMA_PERIOD);

    let (recommendation, confidence) =
        if current_price > sma20 && change > TREND_THRESHOLD_PCT {
            (Recommendation::Buy, Confidence::new(65))
        } else if current_price < sma20 && change < -TREND_THRESHOLD_PCT {
            (Recommendation::Sell, Confidence::new(60))
        } else {
            (Recommendation::Hold, Confidence::new(50))
        };

    let risk_level = RiskLevel::from_volatility(volatility);

    let analysis = format!(
        "Technical analysis for {symbol}:\n\n\
The stock is currently trading at ${current_price:.2}, showing a {change:.2}% change over the past 30 days. \
The 20-day simple moving average is at ${sma20:.2}.\n\n\
Risk Assessment: {risk_level} risk based on {volatility:.2}% volatility.\n\n\
This analysis is based on technical indicators and historical price movements. \
Always conduct thorough research and consult with financial advisors before making investment decisions."
    );

    let key_points = vec![
        format!("Current price: ${current_price:.2}"),
        format!("30-day change: {change:.2}%"),
        format!("20-day SMA: ${sma20:.2}"),
        format!("Volatility: {volatility:.2}% ({risk_level} risk)"),
        format!("Recommendation: {recommendation} ({confidence}% confidence)"),
    ];

    AnalysisResult {
        analysis,
        recommendation,
        confidence,
        risk_level,
        key_points,
    }
}
