use crate::domain::analysis::AnalysisResult;
use crate::domain::contract::LlmAnalysis;
use anyhow::Context;

/// Returns the first balanced `{ ... }` object in `text`. Braces inside JSON
/// string literals are ignored, so fenced blocks and prose around the object
/// are both tolerated.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Strict structured decode of a model reply.
pub fn parse_analysis(text: &str) -> anyhow::Result<AnalysisResult> {
    let json_str = extract_json(text).context("no JSON object found in LLM output")?;
    let parsed = serde_json::from_str::<LlmAnalysis>(json_str)
        .with_context(|| format!("LLM output is not valid JSON for analysis schema: {json_str}"))?;
    parsed.validate_and_into_result(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{Recommendation, RiskLevel};

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body));
    }

    #[test]
    fn extract_json_takes_first_balanced_object() {
        let s = "prefix {\"a\":{\"b\":2}} middle {\"c\":3} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":{\"b\":2}}"));
    }

    #[test]
    fn extract_json_ignores_braces_in_strings() {
        let s = r#"{"analysis":"use } and { freely \" ok"} tail"#;
        assert_eq!(extract_json(s), Some(r#"{"analysis":"use } and { freely \" ok"}"#));
    }

    #[test]
    fn extract_json_requires_closing_brace() {
        assert_eq!(extract_json("{\"a\": 1"), None);
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn parse_analysis_accepts_valid_json() {
        let text = r#"Here you go:
{"recommendation":"BUY","confidence":80,"riskLevel":"LOW","keyPoints":["x"],"analysis":"y"}"#;
        let result = parse_analysis(text).unwrap();
        assert_eq!(result.recommendation, Recommendation::Buy);
        assert_eq!(result.confidence.get(), 80);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.key_points, vec!["x"]);
        assert_eq!(result.analysis, "y");
    }

    #[test]
    fn parse_analysis_rejects_malformed_object() {
        assert!(parse_analysis("{recommendation: BUY}").is_err());
    }

    #[test]
    fn parse_analysis_rejects_non_object_reply() {
        assert!(parse_analysis("I recommend BUY.").is_err());
    }
}
