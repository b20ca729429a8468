//! Price-series statistics shared by every analysis tier.

/// Number of trailing sessions the analysis looks at.
pub const LOOKBACK: usize = 30;

/// Population standard deviation of day-over-day percentage returns.
///
/// Fewer than 2 prices carry no return and yield 0.0. A pair whose base price
/// is not positive is skipped. Two prices give a single return and therefore
/// also 0.0; below ~5 points the value is not a meaningful volatility signal.
pub fn volatility(prices: &[f64]) -> f64 {
    let returns: Vec<f64> = prices
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Mean of the last `min(period, prices.len())` prices. Empty input is 0.0.
pub fn simple_moving_average(prices: &[f64], period: usize) -> f64 {
    let take = period.min(prices.len());
    if take == 0 {
        return 0.0;
    }
    let tail = &prices[prices.len() - take..];
    tail.iter().sum::<f64>() / take as f64
}

/// Percentage change from `base` to `current`; 0.0 when `base` is not positive.
pub fn percent_change(base: f64, current: f64) -> f64 {
    if base <= 0.0 {
        return 0.0;
    }
    (current - base) / base * 100.0
}

/// Summary figures computed once per request and shared by every tier.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    /// Closes of the last [`LOOKBACK`] sessions, oldest first.
    pub recent_closes: Vec<f64>,
    pub price_change_30d: f64,
    pub volatility: f64,
}

impl PriceSummary {
    pub fn new(current_price: f64, closes: &[f64]) -> Self {
        let start = closes.len().saturating_sub(LOOKBACK);
        let recent_closes = closes[start..].to_vec();
        let price_change_30d = recent_closes
            .first()
            .map(|&base| percent_change(base, current_price))
            .unwrap_or(0.0);
        let volatility = volatility(&recent_closes);
        Self {
            recent_closes,
            price_change_30d,
            volatility,
        }
    }
}
