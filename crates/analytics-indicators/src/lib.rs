//! Technical indicators and the enrichment pipeline.
//!
//! This crate provides the indicator set attached to every fetched series:
//! - Moving averages (SMA, EMA)
//! - Momentum indicators (RSI, MACD, Stochastic)
//! - Volatility indicators (ATR, Bollinger Bands, Standard Deviation)
//! - Volume indicators (VWAP, OBV)
//!
//! Every indicator returns one value per input bar, `None` while lookback is
//! insufficient, so columns line up with the bars they describe.

pub mod levels;
pub mod momentum;
pub mod moving_average;
pub mod pipeline;
pub mod stats;
pub mod volatility;
pub mod volume;

pub use levels::{FibonacciLevel, FibonacciLevels};
pub use momentum::{Macd, MacdOutput, Rsi, Stochastic, StochasticOutput};
pub use moving_average::{rolling_mean, Ema, Sma};
pub use pipeline::{enrich, IndicatorPipeline};
pub use stats::compare;
pub use volatility::{Atr, BollingerBands, BollingerOutput, StdDev};
pub use volume::{Obv, Vwap};
