use crate::domain::market::{CompanyInfo, PricePoint};
use serde::Deserialize;
use std::fmt;

pub const MIN_HISTORY_POINTS: usize = 2;

/// Analysis input as it arrives from a caller. Required fields are optional
/// here so that absence can be reported as a validation failure instead of a
/// decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub historical_data: Option<Vec<PricePoint>>,
    #[serde(default)]
    pub company_info: Option<CompanyInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub symbol: String,
    pub current_price: f64,
    pub historical_data: Vec<PricePoint>,
    pub company_info: Option<CompanyInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingFields(Vec<&'static str>),
    InvalidCurrentPrice(f64),
    InsufficientHistory { got: usize },
    InvalidClose { date: chrono::NaiveDate, close: f64 },
    DuplicateDate(chrono::NaiveDate),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingFields(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            ValidationError::InvalidCurrentPrice(p) => {
                write!(f, "currentPrice must be a positive number (got {p})")
            }
            ValidationError::InsufficientHistory { got } => write!(
                f,
                "historicalData must contain at least {MIN_HISTORY_POINTS} points (got {got})"
            ),
            ValidationError::InvalidClose { date, close } => {
                write!(f, "close on {date} must be a positive number (got {close})")
            }
            ValidationError::DuplicateDate(date) => {
                write!(f, "historicalData has more than one point for {date}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl AnalysisRequest {
    /// Checks required fields and normalizes the series to ascending date
    /// order. Repeated dates are rejected since either close could be meant.
    pub fn validate(self) -> Result<ValidatedRequest, ValidationError> {
        let symbol = self
            .symbol
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty());

        let mut missing = Vec::new();
        if symbol.is_none() {
            missing.push("symbol");
        }
        if self.current_price.is_none() {
            missing.push("currentPrice");
        }
        if self.historical_data.is_none() {
            missing.push("historicalData");
        }
        let (Some(symbol), Some(current_price), Some(mut historical_data)) =
            (symbol, self.current_price, self.historical_data)
        else {
            return Err(ValidationError::MissingFields(missing));
        };

        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(ValidationError::InvalidCurrentPrice(current_price));
        }

        if historical_data.len() < MIN_HISTORY_POINTS {
            return Err(ValidationError::InsufficientHistory {
                got: historical_data.len(),
            });
        }

        if let Some(bad) = historical_data
            .iter()
            .find(|p| !p.close.is_finite() || p.close <= 0.0)
        {
            return Err(ValidationError::InvalidClose {
                date: bad.date,
                close: bad.close,
            });
        }

        historical_data.sort_by_key(|p| p.date);
        if let Some(pair) = historical_data.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ValidationError::DuplicateDate(pair[0].date));
        }

        Ok(ValidatedRequest {
            symbol,
            current_price,
            historical_data,
            company_info: self.company_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    fn request(history: Vec<PricePoint>) -> AnalysisRequest {
        AnalysisRequest {
            symbol: Some(" ibm ".to_string()),
            current_price: Some(101.0),
            historical_data: Some(history),
            company_info: None,
        }
    }

    #[test]
    fn reports_every_missing_field() {
        let req: AnalysisRequest = serde_json::from_value(json!({"currentPrice": 10.0})).unwrap();
        assert_eq!(
            req.validate().unwrap_err(),
            ValidationError::MissingFields(vec!["symbol", "historicalData"])
        );
    }

    #[test]
    fn blank_symbol_counts_as_missing() {
        let mut req = request(vec![point(1, 1.0), point(2, 2.0)]);
        req.symbol = Some("   ".to_string());
        assert!(matches!(
            req.validate(),
            Err(ValidationError::MissingFields(f)) if f == vec!["symbol"]
        ));
    }

    #[test]
    fn rejects_single_point_history() {
        let err = request(vec![point(1, 100.0)]).validate().unwrap_err();
        assert_eq!(err, ValidationError::InsufficientHistory { got: 1 });
    }

    #[test]
    fn rejects_zero_close() {
        let err = request(vec![point(1, 0.0), point(2, 100.0)])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidClose { close, .. } if close == 0.0));
    }

    #[test]
    fn rejects_non_positive_current_price() {
        let mut req = request(vec![point(1, 1.0), point(2, 2.0)]);
        req.current_price = Some(0.0);
        assert_eq!(
            req.validate().unwrap_err(),
            ValidationError::InvalidCurrentPrice(0.0)
        );
    }

    #[test]
    fn sorts_newest_first_history() {
        let ok = request(vec![point(3, 3.0), point(1, 1.0), point(2, 2.0)])
            .validate()
            .unwrap();
        let closes: Vec<f64> = ok.historical_data.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rejects_repeated_dates() {
        let err = request(vec![point(1, 1.0), point(2, 2.0), point(2, 2.5)])
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateDate(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap())
        );
        assert_eq!(
            err.to_string(),
            "historicalData has more than one point for 2026-01-02"
        );
    }

    #[test]
    fn normalizes_symbol() {
        let ok = request(vec![point(1, 1.0), point(2, 2.0)]).validate().unwrap();
        assert_eq!(ok.symbol, "IBM");
        assert_eq!(ok.historical_data.len(), 2);
    }
}
