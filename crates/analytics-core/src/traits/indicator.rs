//! Indicator trait definitions.

use crate::types::Bar;

/// Trait for indicators computed from a single price column.
///
/// Output is aligned with the input: one entry per input value, `None` while
/// the indicator lacks lookback.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// # Arguments
    /// * `data` - Input data (typically close prices)
    ///
    /// # Returns
    /// A vector with the same length as `data`
    fn calculate(&self, data: &[f64]) -> Vec<Option<Self::Output>>;

    /// Get the lookback window.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

/// Indicator that uses full OHLCV bars rather than one column.
pub trait BarIndicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values from OHLCV bars, aligned with `bars`.
    fn calculate(&self, bars: &[Bar]) -> Vec<Option<Self::Output>>;

    /// Get the lookback window (0 for cumulative indicators).
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}
