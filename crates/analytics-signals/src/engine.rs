//! Signal engine: runs the ordered rule list against the latest bars.

use analytics_core::types::{EnrichedSeries, Signal, SignalReport};
use tracing::debug;

use crate::rules::{BollingerRule, MacdRule, RsiRule, SignalRule, StochasticRule, VwapRule};

/// Ordered collection of signal rules.
pub struct SignalEngine {
    rules: Vec<Box<dyn SignalRule>>,
}

impl SignalEngine {
    /// Create an engine with an explicit rule list.
    pub fn new(rules: Vec<Box<dyn SignalRule>>) -> Self {
        Self { rules }
    }

    /// RSI, MACD, Bollinger, Stochastic, VWAP with default thresholds.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(RsiRule::default()),
            Box::new(MacdRule),
            Box::new(BollingerRule),
            Box::new(StochasticRule::default()),
            Box::new(VwapRule),
        ])
    }

    /// Names of the configured rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate every rule against the two most recent rows.
    ///
    /// Returns an empty list when the series has fewer than two rows.
    pub fn evaluate(&self, series: &EnrichedSeries) -> Vec<Signal> {
        let Some((prev, cur)) = series.last_two() else {
            debug!(symbol = %series.symbol, rows = series.len(), "Not enough rows for signals");
            return Vec::new();
        };

        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(prev, cur))
            .collect()
    }

    /// Evaluate and aggregate into a report.
    pub fn report(&self, ticker: &str, series: &EnrichedSeries) -> SignalReport {
        SignalReport::new(ticker, self.evaluate(series))
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::standard()
    }
}
