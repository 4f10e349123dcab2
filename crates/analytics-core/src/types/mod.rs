//! Core data types for the analytics service.

mod enriched;
mod interval;
mod market;
mod ohlcv;
mod signal;

pub use enriched::{EnrichedBar, EnrichedSeries, IndicatorValues};
pub use interval::{Interval, Period};
pub use market::{
    CompanyInfo, ComparisonPoint, ComparisonReport, Metadata, MarketOverview, Mover,
    PerformanceStats, QuoteSnapshot, SymbolMatch,
};
pub use ohlcv::{Bar, BarSeries};
pub use signal::{Judgment, Signal, SignalReport, SignalTally};
