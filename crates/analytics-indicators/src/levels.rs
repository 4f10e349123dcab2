//! Fibonacci retracement levels.

use analytics_core::round_dp;
use serde::{Deserialize, Serialize};

/// Retracement ratios, from the period high down to the period low.
pub const FIBONACCI_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// One retracement level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevel {
    /// Label such as `"61.8%"`
    pub level: String,
    pub ratio: f64,
    /// `high - ratio * (high - low)`, rounded to 2 decimals
    pub price: f64,
}

/// Retracement levels of a price range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub high: f64,
    pub low: f64,
    pub levels: Vec<FibonacciLevel>,
}

impl FibonacciLevels {
    /// Compute the levels for a `(high, low)` range.
    pub fn from_range(high: f64, low: f64) -> Self {
        let range = high - low;
        let levels = FIBONACCI_RATIOS
            .iter()
            .map(|&ratio| FibonacciLevel {
                level: format!("{:.1}%", ratio * 100.0),
                ratio,
                price: round_dp(high - ratio * range, 2),
            })
            .collect();

        Self {
            high: round_dp(high, 2),
            low: round_dp(low, 2),
            levels,
        }
    }

    /// Price at a given ratio, if it is one of the standard ratios.
    pub fn price_at(&self, ratio: f64) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| (l.ratio - ratio).abs() < 1e-9)
            .map(|l| l.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_high_and_low() {
        let fib = FibonacciLevels::from_range(150.0, 100.0);

        assert_eq!(fib.levels.len(), 7);
        assert_eq!(fib.price_at(0.0), Some(150.0));
        assert_eq!(fib.price_at(1.0), Some(100.0));
        assert_eq!(fib.price_at(0.5), Some(125.0));
        assert_eq!(fib.price_at(0.618), Some(119.1));
    }

    #[test]
    fn test_zero_to_hundred_levels() {
        let fib = FibonacciLevels::from_range(100.0, 0.0);
        let prices: Vec<f64> = fib.levels.iter().map(|l| l.price).collect();

        assert_eq!(prices, vec![100.0, 76.4, 61.8, 50.0, 38.2, 21.4, 0.0]);
        assert_eq!(fib.high, 100.0);
        assert_eq!(fib.low, 0.0);
    }

    #[test]
    fn test_labels() {
        let fib = FibonacciLevels::from_range(10.0, 0.0);
        let labels: Vec<&str> = fib.levels.iter().map(|l| l.level.as_str()).collect();

        assert_eq!(labels, vec!["0.0%", "23.6%", "38.2%", "50.0%", "61.8%", "78.6%", "100.0%"]);
    }

    #[test]
    fn test_flat_range() {
        let fib = FibonacciLevels::from_range(42.0, 42.0);
        assert!(fib.levels.iter().all(|l| l.price == 42.0));
    }
}
