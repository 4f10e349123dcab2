//! Signal evaluation over enriched series.
//!
//! This crate maps the latest indicator values into advisory judgments:
//! - RSI overbought/oversold
//! - MACD crossovers
//! - Bollinger band touches
//! - Stochastic %K extremes
//! - Price relative to VWAP
//!
//! Rules run in a fixed order and each may skip itself when its inputs are
//! undefined.

mod engine;
mod rules;

pub use engine::SignalEngine;
pub use rules::{BollingerRule, MacdRule, RsiRule, SignalRule, StochasticRule, VwapRule};
