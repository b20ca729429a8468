use crate::analysis::interpreter::{self, Interpretation};
use crate::analysis::metrics::PriceSummary;
use crate::analysis::{deterministic, prompt};
use crate::domain::analysis::{Analysis, AnalysisTier};
use crate::domain::request::{AnalysisRequest, ValidatedRequest, ValidationError};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::LlmClient;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Runs the degrade chain: structured model reply, then heuristic reading of
/// the reply, then the offline analyzer when the model call fails.
#[derive(Clone)]
pub struct Analyzer {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl Analyzer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `ANALYSIS_TIMEOUT_SECS`, falling back to the default.
    pub fn from_env(llm: Arc<dyn LlmClient>) -> Self {
        let timeout_secs = std::env::var("ANALYSIS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(llm).with_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the request, then always produces an analysis.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<Analysis, ValidationError> {
        let request = request.validate()?;
        Ok(self.analyze_validated(&request).await)
    }

    pub async fn analyze_validated(&self, request: &ValidatedRequest) -> Analysis {
        let summary = summarize(request);
        let prompt = prompt::build_prompt(
            &request.symbol,
            request.current_price,
            &summary,
            request.company_info.as_ref(),
        );

        let reply = match tokio::time::timeout(self.timeout, self.llm.complete(&prompt)).await {
            Ok(res) => res,
            Err(_) => Err(LlmDiagnosticsError::timeout(self.llm.provider(), self.timeout).into()),
        };

        match reply {
            Ok(text) => match interpreter::interpret(&text, &summary) {
                Interpretation::Structured(result) => {
                    tracing::info!(symbol = %request.symbol, "analysis from structured model reply");
                    Analysis {
                        tier: AnalysisTier::Structured,
                        result,
                    }
                }
                Interpretation::Heuristic(result) => {
                    tracing::info!(symbol = %request.symbol, "analysis from free-text model reply");
                    Analysis {
                        tier: AnalysisTier::Heuristic,
                        result,
                    }
                }
            },
            Err(err) => {
                let diag = err.downcast_ref::<LlmDiagnosticsError>();
                tracing::warn!(
                    symbol = %request.symbol,
                    provider = self.llm.provider().as_str(),
                    stage = diag.map(|d| d.stage),
                    raw_output = diag.and_then(|d| d.raw_output.as_deref()),
                    error = %err,
                    "LLM analysis failed; falling back to technical analysis"
                );
                offline(request)
            }
        }
    }
}

/// The deterministic tier alone. Never touches the network.
pub fn offline(request: &ValidatedRequest) -> Analysis {
    let summary = summarize(request);
    Analysis {
        tier: AnalysisTier::Deterministic,
        result: deterministic::analyze(&request.symbol, request.current_price, &summary),
    }
}

fn summarize(request: &ValidatedRequest) -> PriceSummary {
    let closes: Vec<f64> = request.historical_data.iter().map(|p| p.close).collect();
    PriceSummary::new(request.current_price, &closes)
}
