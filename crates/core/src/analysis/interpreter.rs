use crate::analysis::metrics::PriceSummary;
use crate::domain::analysis::{
    AnalysisResult, Confidence, Recommendation, RiskLevel, MAX_KEY_POINTS,
};
use crate::llm::json;
use regex::Regex;
use std::sync::OnceLock;

/// Outcome of reading a model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// The reply contained a JSON object that satisfied the analysis contract.
    Structured(AnalysisResult),
    /// No usable JSON object; fields were mined from free text.
    Heuristic(AnalysisResult),
}

pub fn interpret(text: &str, summary: &PriceSummary) -> Interpretation {
    match json::parse_analysis(text) {
        Ok(result) => Interpretation::Structured(result),
        Err(err) => {
            tracing::debug!(error = %err, "structured decode failed; using text heuristics");
            Interpretation::Heuristic(heuristic(text, summary))
        }
    }
}

/// Builds a result from free text. Risk comes from the measured volatility,
/// never from the text.
pub fn heuristic(text: &str, summary: &PriceSummary) -> AnalysisResult {
    let recommendation = find_recommendation(text);
    let confidence = find_confidence(text);
    let risk_level = RiskLevel::from_volatility(summary.volatility);

    let mut key_points = find_bullets(text);
    if key_points.is_empty() {
        key_points = vec![
            format!("30-day price change: {:.2}%", summary.price_change_30d),
            format!("Volatility level: {:.2}%", summary.volatility),
            format!("AI recommendation: {recommendation}"),
        ];
    }

    AnalysisResult {
        analysis: text.to_string(),
        recommendation,
        confidence,
        risk_level,
        key_points,
    }
}

const RECOMMENDATION_PATTERN: &str = r"(?i)\b(BUY|SELL|HOLD)\b";
const CONFIDENCE_PATTERN: &str = r"(?i)confidence[:\s]+(\d+)";

type CompiledPattern = OnceLock<Result<Regex, regex::Error>>;

/// Compiles `pattern` once. A compile failure is logged on every use and the
/// extractor falls back to its default.
fn compiled(cell: &'static CompiledPattern, pattern: &'static str) -> Option<&'static Regex> {
    match cell.get_or_init(|| Regex::new(pattern)) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::error!(pattern, error = %err, "heuristic pattern failed to compile");
            None
        }
    }
}

fn recommendation_re() -> Option<&'static Regex> {
    static RE: CompiledPattern = OnceLock::new();
    compiled(&RE, RECOMMENDATION_PATTERN)
}

fn confidence_re() -> Option<&'static Regex> {
    static RE: CompiledPattern = OnceLock::new();
    compiled(&RE, CONFIDENCE_PATTERN)
}

/// First whole-word BUY/SELL/HOLD, any case. Defaults to HOLD.
pub fn find_recommendation(text: &str) -> Recommendation {
    recommendation_re()
        .and_then(|re| re.find(text))
        .and_then(|m| Recommendation::parse(m.as_str()))
        .unwrap_or_default()
}

/// Integer following "confidence", clamped to 100. Defaults to 50.
pub fn find_confidence(text: &str) -> Confidence {
    confidence_re()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| match m.as_str().parse::<u64>() {
            Ok(n) => Confidence::from_u64(n),
            // Too many digits for u64 is still "more than 100".
            Err(_) => Confidence::new(100),
        })
        .unwrap_or_default()
}

/// Up to five lines that start with `-` or `•`, marker stripped.
pub fn find_bullets(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let rest = line
                .strip_prefix('-')
                .or_else(|| line.strip_prefix('•'))?;
            let item = rest.trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .take(MAX_KEY_POINTS)
        .collect()
}
