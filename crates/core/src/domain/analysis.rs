use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_KEY_POINTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    #[default]
    Hold,
    Sell,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
        }
    }

    /// Case-insensitive match on the bare token. Anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Some(Recommendation::Buy),
            "HOLD" => Some(Recommendation::Hold),
            "SELL" => Some(Recommendation::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    const HIGH_ABOVE: f64 = 5.0;
    const LOW_BELOW: f64 = 2.0;

    /// Risk bucket for a volatility expressed in percent.
    pub fn from_volatility(volatility: f64) -> Self {
        if volatility > Self::HIGH_ABOVE {
            RiskLevel::High
        } else if volatility < Self::LOW_BELOW {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence percentage, always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(u8);

impl Confidence {
    pub const DEFAULT: Confidence = Confidence(50);

    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::DEFAULT;
        }
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis: String,
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
    pub key_points: Vec<String>,
}

/// Which stage of the degrade chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisTier {
    Structured,
    Heuristic,
    Deterministic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub tier: AnalysisTier,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_thresholds_are_exclusive() {
        assert_eq!(RiskLevel::from_volatility(5.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_volatility(5.01), RiskLevel::High);
        assert_eq!(RiskLevel::from_volatility(2.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_volatility(1.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_volatility(0.0), RiskLevel::Low);
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(Confidence::from_f64(140.0).get(), 100);
        assert_eq!(Confidence::from_f64(-3.0).get(), 0);
        assert_eq!(Confidence::from_f64(f64::NAN), Confidence::DEFAULT);
        assert_eq!(Confidence::from_u64(u64::MAX).get(), 100);
        assert_eq!(Confidence::new(255).get(), 100);
    }

    #[test]
    fn serializes_with_uppercase_enums_and_camel_case_keys() {
        let result = AnalysisResult {
            analysis: "y".to_string(),
            recommendation: Recommendation::Buy,
            confidence: Confidence::new(80),
            risk_level: RiskLevel::Low,
            key_points: vec!["x".to_string()],
        };
        let v = serde_json::to_value(Analysis {
            tier: AnalysisTier::Structured,
            result,
        })
        .unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "tier": "structured",
                "analysis": "y",
                "recommendation": "BUY",
                "confidence": 80,
                "riskLevel": "LOW",
                "keyPoints": ["x"],
            })
        );
    }

    #[test]
    fn parses_tokens_case_insensitively() {
        assert_eq!(Recommendation::parse(" sell "), Some(Recommendation::Sell));
        assert_eq!(Recommendation::parse("STRONG BUY"), None);
        assert_eq!(RiskLevel::parse("high"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("extreme"), None);
    }
}
