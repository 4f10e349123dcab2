//! Core traits for the analytics service.

mod indicator;
mod provider;

pub use indicator::{BarIndicator, Indicator};
pub use provider::MarketDataProvider;
