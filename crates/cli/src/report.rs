use stocklens_core::domain::analysis::Analysis;
use stocklens_core::domain::market::SearchMatch;

pub fn render_matches(matches: &[SearchMatch]) -> String {
    if matches.is_empty() {
        return "no matches\n".to_string();
    }
    let width = matches.iter().map(|m| m.symbol.len()).max().unwrap_or(0);
    matches
        .iter()
        .map(|m| {
            format!(
                "{:<width$}  {} ({}, {})\n",
                m.symbol, m.name, m.kind, m.region
            )
        })
        .collect()
}

pub fn render_analysis(symbol: &str, analysis: &Analysis) -> String {
    let r = &analysis.result;
    let mut out = format!(
        "{symbol}: {} (confidence {}%, {} risk) [{:?}]\n",
        r.recommendation, r.confidence, r.risk_level, analysis.tier
    );
    for point in &r.key_points {
        out.push_str(&format!("  - {point}\n"));
    }
    out.push('\n');
    out.push_str(r.analysis.trim_end());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocklens_core::domain::analysis::{
        AnalysisResult, AnalysisTier, Confidence, Recommendation, RiskLevel,
    };

    #[test]
    fn renders_header_and_points() {
        let analysis = Analysis {
            tier: AnalysisTier::Heuristic,
            result: AnalysisResult {
                analysis: "Looks fine.\n".to_string(),
                recommendation: Recommendation::Hold,
                confidence: Confidence::new(55),
                risk_level: RiskLevel::Medium,
                key_points: vec!["steady margins".to_string()],
            },
        };
        assert_eq!(
            render_analysis("IBM", &analysis),
            "IBM: HOLD (confidence 55%, MEDIUM risk) [Heuristic]\n  - steady margins\n\nLooks fine.\n"
        );
    }

    #[test]
    fn aligns_symbols() {
        let matches = vec![
            SearchMatch {
                symbol: "IBM".to_string(),
                name: "International Business Machines".to_string(),
                kind: "Equity".to_string(),
                region: "United States".to_string(),
            },
            SearchMatch {
                symbol: "IBM.DEX".to_string(),
                name: "IBM".to_string(),
                kind: "Equity".to_string(),
                region: "XETRA".to_string(),
            },
        ];
        assert_eq!(
            render_matches(&matches),
            "IBM      International Business Machines (Equity, United States)\n\
IBM.DEX  IBM (Equity, XETRA)\n"
        );
        assert_eq!(render_matches(&[]), "no matches\n");
    }
}
