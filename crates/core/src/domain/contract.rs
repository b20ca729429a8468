use crate::domain::analysis::{
    AnalysisResult, Confidence, Recommendation, RiskLevel, MAX_KEY_POINTS,
};
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};

/// The JSON object the model is asked to produce. Every key is optional; the
/// model is free to omit any of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmAnalysis {
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub key_points: Option<Vec<String>>,
    #[serde(default)]
    pub analysis: Option<String>,
}

impl LlmAnalysis {
    /// Applies defaults for absent keys and rejects values outside the
    /// enumerations. `raw_text` is the full model reply and stands in for a
    /// missing or blank `analysis`.
    pub fn validate_and_into_result(self, raw_text: &str) -> anyhow::Result<AnalysisResult> {
        let recommendation = match self.recommendation.as_deref() {
            None => Recommendation::default(),
            Some(s) => match Recommendation::parse(s) {
                Some(r) => r,
                None => bail!("unrecognized recommendation: {s:?}"),
            },
        };

        let risk_level = match self.risk_level.as_deref() {
            None => RiskLevel::default(),
            Some(s) => match RiskLevel::parse(s) {
                Some(r) => r,
                None => bail!("unrecognized riskLevel: {s:?}"),
            },
        };

        let confidence = match self.confidence {
            None => Confidence::default(),
            Some(c) => {
                ensure!(c.is_finite(), "confidence must be finite (got {c})");
                Confidence::from_f64(c)
            }
        };

        let key_points: Vec<String> = self
            .key_points
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(MAX_KEY_POINTS)
            .collect();

        let analysis = self
            .analysis
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| raw_text.to_string());

        Ok(AnalysisResult {
            analysis,
            recommendation,
            confidence,
            risk_level,
            key_points,
        })
    }
}
