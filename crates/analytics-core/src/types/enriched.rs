//! OHLCV series enriched with technical indicator values.

use serde::{Deserialize, Serialize};

use super::{Bar, Interval, Period};

/// Indicator values attached to a single bar.
///
/// `None` means the indicator does not have enough lookback at this bar yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub rsi_14: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub vwap: Option<f64>,
    pub atr_14: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub obv: Option<f64>,
}

/// A bar together with its indicator values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub indicators: IndicatorValues,
}

/// Bars of one (symbol, period, interval) request plus indicator columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSeries {
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
    pub rows: Vec<EnrichedBar>,
}

impl EnrichedSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent row.
    pub fn last(&self) -> Option<&EnrichedBar> {
        self.rows.last()
    }

    /// The two most recent rows as `(previous, current)`.
    pub fn last_two(&self) -> Option<(&EnrichedBar, &EnrichedBar)> {
        match self.rows.as_slice() {
            [.., prev, cur] => Some((prev, cur)),
            _ => None,
        }
    }

    /// Highest high over the whole series.
    pub fn highest_high(&self) -> Option<f64> {
        self.rows.iter().map(|r| r.bar.high).reduce(f64::max)
    }

    /// Lowest low over the whole series.
    pub fn lowest_low(&self) -> Option<f64> {
        self.rows.iter().map(|r| r.bar.low).reduce(f64::min)
    }
}
