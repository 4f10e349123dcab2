//! Advisory signal types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete judgment emitted by a signal rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Judgment {
    Buy,
    Sell,
    Neutral,
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Judgment::Buy => "BUY",
            Judgment::Sell => "SELL",
            Judgment::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

/// One indicator's verdict on the latest bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Indicator that produced the signal
    pub indicator: String,
    /// BUY / SELL / NEUTRAL
    #[serde(rename = "signal")]
    pub judgment: Judgment,
    /// Indicator reading, rounded for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Human-readable explanation
    pub detail: String,
}

impl Signal {
    pub fn new(indicator: &str, judgment: Judgment, value: Option<f64>, detail: impl Into<String>) -> Self {
        Self {
            indicator: indicator.to_string(),
            judgment,
            value,
            detail: detail.into(),
        }
    }
}

/// Vote counts across a set of signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalTally {
    pub buy: usize,
    pub sell: usize,
    pub neutral: usize,
}

impl SignalTally {
    /// Count the judgments of the given signals.
    pub fn count(signals: &[Signal]) -> Self {
        signals.iter().fold(Self::default(), |mut tally, s| {
            match s.judgment {
                Judgment::Buy => tally.buy += 1,
                Judgment::Sell => tally.sell += 1,
                Judgment::Neutral => tally.neutral += 1,
            }
            tally
        })
    }

    /// Majority of BUY over SELL; ties (including 0-0) are NEUTRAL.
    pub fn overall(&self) -> Judgment {
        use std::cmp::Ordering;
        match self.buy.cmp(&self.sell) {
            Ordering::Greater => Judgment::Buy,
            Ordering::Less => Judgment::Sell,
            Ordering::Equal => Judgment::Neutral,
        }
    }
}

/// Response body of the signals endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub overall: Judgment,
    pub buy_count: usize,
    pub sell_count: usize,
    pub neutral_count: usize,
    pub signals: Vec<Signal>,
}

impl SignalReport {
    pub fn new(ticker: impl Into<String>, signals: Vec<Signal>) -> Self {
        let tally = SignalTally::count(&signals);
        Self {
            ticker: ticker.into(),
            timestamp: Utc::now(),
            overall: tally.overall(),
            buy_count: tally.buy,
            sell_count: tally.sell,
            neutral_count: tally.neutral,
            signals,
        }
    }
}
