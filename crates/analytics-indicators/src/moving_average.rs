//! Moving average indicators.

use analytics_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values. Undefined until a
/// full window exists.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        if data.len() < self.period {
            return result;
        }

        let period_f64 = self.period as f64;

        // Initial sum
        let mut sum: f64 = data[..self.period].iter().sum();
        result[self.period - 1] = Some(sum / period_f64);

        // Sliding window
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result[i] = Some(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA).
///
/// Smoothing factor 2/(n+1), seeded with the first value, so the average is
/// defined from the first bar on.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
}

impl Ema {
    /// Create a new EMA with the specified span.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        let multiplier = 2.0 / (period as f64 + 1.0);
        Self { period, multiplier }
    }

    /// Create an EMA with a custom smoothing factor.
    pub fn with_multiplier(period: usize, multiplier: f64) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        assert!(
            (0.0..=1.0).contains(&multiplier),
            "Multiplier must be between 0 and 1"
        );
        Self { period, multiplier }
    }

    /// Smoothing factor applied to each new value.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// EMA over a column that may contain undefined leading values.
    ///
    /// The average is seeded with the first defined value; undefined inputs
    /// before the seed stay undefined, later ones carry the last average.
    pub fn calculate_sparse(&self, data: &[Option<f64>]) -> Vec<Option<f64>> {
        let one_minus_mult = 1.0 - self.multiplier;
        let mut ema: Option<f64> = None;

        data.iter()
            .map(|value| {
                ema = match (ema, *value) {
                    (None, v) => v,
                    (Some(prev), Some(v)) => Some(v * self.multiplier + prev * one_minus_mult),
                    (Some(prev), None) => Some(prev),
                };
                ema
            })
            .collect()
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let Some(&first) = data.first() else {
            return vec![];
        };

        let mut result = Vec::with_capacity(data.len());
        let mut ema = first;
        let one_minus_mult = 1.0 - self.multiplier;
        result.push(Some(ema));

        for &price in &data[1..] {
            ema = price * self.multiplier + ema * one_minus_mult;
            result.push(Some(ema));
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Rolling mean over a column with undefined entries.
///
/// A window containing any undefined value is itself undefined.
pub fn rolling_mean(data: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    assert!(window > 0, "Window must be greater than 0");
    (0..data.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &data[i + 1 - window..=i];
            let sum = slice.iter().try_fold(0.0, |acc, v| v.map(|v| acc + v))?;
            Some(sum / window as f64)
        })
        .collect()
}
