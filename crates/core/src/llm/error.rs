use crate::llm::Provider;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Failure from a model provider, tagged with the stage that produced it.
///
/// The raw body is kept so a warning log can show what the provider sent back.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub fn new(provider: Provider, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            detail: detail.into(),
            raw_output: None,
            raw_response_json: None,
        }
    }

    pub fn timeout(provider: Provider, after: Duration) -> Self {
        Self::new(provider, "timeout", format!("no response within {after:?}"))
    }

    pub fn with_raw_output(mut self, raw: String) -> Self {
        self.raw_output = Some(raw);
        self
    }

    pub fn with_raw_json(mut self, raw: Option<Value>) -> Self {
        self.raw_response_json = raw;
        self
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} failed: {}",
            self.provider.as_str(),
            self.stage,
            self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}
