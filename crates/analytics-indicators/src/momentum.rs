//! Momentum indicators.

use analytics_core::traits::{BarIndicator, Indicator};
use analytics_core::types::Bar;
use serde::{Deserialize, Serialize};

use crate::moving_average::{rolling_mean, Ema};

/// Substitute for a zero denominator, so ratios stay finite.
pub(crate) const ZERO_GUARD: f64 = 1e-10;

pub(crate) fn guard_zero(value: f64) -> f64 {
    if value == 0.0 {
        ZERO_GUARD
    } else {
        value
    }
}

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes
/// to evaluate overbought or oversold conditions.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Exponential smoothing with alpha = 1/period, seeded with the first change.
    ///
    /// Returns the running average after each change.
    fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
        let alpha = 1.0 / period as f64;
        let mut avg: Option<f64> = None;

        values
            .iter()
            .map(|&value| {
                let next = match avg {
                    None => value,
                    Some(prev) => prev * (1.0 - alpha) + value * alpha,
                };
                avg = Some(next);
                next
            })
            .collect()
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        if data.len() <= self.period {
            return result;
        }

        // Calculate price changes
        let mut gains = Vec::with_capacity(data.len() - 1);
        let mut losses = Vec::with_capacity(data.len() - 1);

        for i in 1..data.len() {
            let change = data[i] - data[i - 1];
            if change > 0.0 {
                gains.push(change);
                losses.push(0.0);
            } else {
                gains.push(0.0);
                losses.push(-change);
            }
        }

        // Smooth gains and losses
        let avg_gains = Self::wilder_smooth(&gains, self.period);
        let avg_losses = Self::wilder_smooth(&losses, self.period);

        // Change j belongs to bar j + 1; a value needs `period` changes.
        for (j, (&gain, &loss)) in avg_gains.iter().zip(avg_losses.iter()).enumerate() {
            if j + 1 < self.period {
                continue;
            }
            let rs = gain / guard_zero(loss);
            result[j + 1] = Some(100.0 - (100.0 / (1.0 + rs)));
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// MACD (Moving Average Convergence Divergence) output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// MACD line (fast EMA - slow EMA)
    pub macd: f64,
    /// Signal line (EMA of MACD)
    pub signal: f64,
    /// Histogram (MACD - Signal)
    pub histogram: f64,
}

/// MACD indicator.
///
/// Uses two EMAs to identify trend direction and momentum. Every component
/// is an EMA seeded with the first value, so the output is defined from the
/// first bar.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    slow_period: usize,
}

impl Macd {
    /// Create a new MACD with default parameters (12, 26, 9).
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    /// Create a MACD with custom periods.
    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0);
        assert!(fast < slow, "Fast period must be less than slow period");
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            slow_period: slow,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for Macd {
    type Output = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<Option<MacdOutput>> {
        let fast_ema = self.fast.calculate(data);
        let slow_ema = self.slow.calculate(data);

        let macd_line: Vec<Option<f64>> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();

        let signal_line = self.signal.calculate_sparse(&macd_line);

        macd_line
            .iter()
            .zip(signal_line.iter())
            .map(|(macd, signal)| {
                let (macd, signal) = ((*macd)?, (*signal)?);
                Some(MacdOutput {
                    macd,
                    signal,
                    histogram: macd - signal,
                })
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.slow_period
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

/// Stochastic oscillator output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticOutput {
    /// %K (fast stochastic)
    pub k: f64,
    /// %D (SMA of %K), undefined for the first `d_period - 1` %K values
    pub d: Option<f64>,
}

/// Stochastic oscillator.
///
/// Compares closing price to the price range over a period.
#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Stochastic {
    /// Create a new stochastic oscillator with default parameters (14, 3).
    pub fn new() -> Self {
        Self::with_periods(14, 3)
    }

    /// Create with custom periods.
    pub fn with_periods(k_period: usize, d_period: usize) -> Self {
        assert!(k_period > 0 && d_period > 0);
        Self { k_period, d_period }
    }

    /// Calculate stochastic from OHLC columns.
    pub fn calculate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<Option<StochasticOutput>> {
        let len = high.len().min(low.len()).min(close.len());

        // Calculate raw %K values
        let mut k_values = vec![None; len];

        for i in (self.k_period.saturating_sub(1))..len {
            let start = i + 1 - self.k_period;
            let highest = high[start..=i]
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            let lowest = low[start..=i]
                .iter()
                .cloned()
                .fold(f64::INFINITY, f64::min);

            let range = guard_zero(highest - lowest);
            k_values[i] = Some(100.0 * (close[i] - lowest) / range);
        }

        let d_values = rolling_mean(&k_values, self.d_period);

        k_values
            .iter()
            .zip(d_values.iter())
            .map(|(k, d)| k.map(|k| StochasticOutput { k, d: *d }))
            .collect()
    }
}

impl Default for Stochastic {
    fn default() -> Self {
        Self::new()
    }
}

impl BarIndicator for Stochastic {
    type Output = StochasticOutput;

    fn calculate(&self, bars: &[Bar]) -> Vec<Option<StochasticOutput>> {
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        self.calculate_ohlc(&high, &low, &close)
    }

    fn period(&self) -> usize {
        self.k_period + self.d_period - 1
    }

    fn name(&self) -> &str {
        "Stochastic"
    }
}
