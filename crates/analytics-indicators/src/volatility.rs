//! Volatility indicators.

use analytics_core::traits::{BarIndicator, Indicator};
use analytics_core::types::Bar;
use serde::{Deserialize, Serialize};

/// Rolling sample standard deviation (n - 1 denominator).
#[derive(Debug, Clone)]
pub struct StdDev {
    period: usize,
}

impl StdDev {
    /// Create a new standard deviation indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        Self { period }
    }

    fn window_std(window: &[f64]) -> (f64, f64) {
        let n = window.len() as f64;
        let mean: f64 = window.iter().sum::<f64>() / n;
        let variance: f64 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, variance.sqrt())
    }
}

impl Indicator for StdDev {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        for (i, window) in data.windows(self.period).enumerate() {
            result[i + self.period - 1] = Some(Self::window_std(window).1);
        }
        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "StdDev"
    }
}

/// Average True Range (ATR).
///
/// Simple rolling mean of the true range. The first bar has no previous close,
/// so its true range is its high-low range.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    /// Create a new ATR indicator.
    ///
    /// Common period is 14.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl BarIndicator for Atr {
    type Output = f64;

    fn calculate(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        // Calculate True Range
        let tr: Vec<f64> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let prev_close = i.checked_sub(1).map(|p| bars[p].close);
                bar.true_range(prev_close)
            })
            .collect();

        let mut result = vec![None; tr.len()];
        if tr.len() < self.period {
            return result;
        }

        let period_f64 = self.period as f64;
        let mut sum: f64 = tr[..self.period].iter().sum();
        result[self.period - 1] = Some(sum / period_f64);

        for i in self.period..tr.len() {
            sum = sum - tr[i - self.period] + tr[i];
            result[i] = Some(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    /// Upper band
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    /// Lower band
    pub lower: f64,
}

impl BollingerOutput {
    /// Check if price is at or above the upper band.
    pub fn is_overbought(&self, price: f64) -> bool {
        price >= self.upper
    }

    /// Check if price is at or below the lower band.
    pub fn is_oversold(&self, price: f64) -> bool {
        price <= self.lower
    }
}

/// Bollinger Bands.
///
/// Consists of a middle band (SMA) with upper and lower bands
/// at a specified number of sample standard deviations.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Create new Bollinger Bands with default parameters (20, 2.0).
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    /// Create Bollinger Bands with custom parameters.
    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<Option<BollingerOutput>> {
        let mut result = vec![None; data.len()];

        for (i, window) in data.windows(self.period).enumerate() {
            let (mean, std_dev) = StdDev::window_std(window);
            result[i + self.period - 1] = Some(BollingerOutput {
                upper: mean + self.std_dev_multiplier * std_dev,
                middle: mean,
                lower: mean - self.std_dev_multiplier * std_dev,
            });
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }
}
