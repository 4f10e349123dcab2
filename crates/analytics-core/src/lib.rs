//! Core types and traits for the stock analytics service.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, EnrichedSeries)
//! - Advisory signals and their aggregate judgment
//! - Quote, company, comparison and overview payloads
//! - Core traits for indicators and upstream market data providers

pub mod error;
pub mod rounding;
pub mod traits;
pub mod types;

pub use error::{FetchError, ProviderError};
pub use rounding::{round_dp, round_opt};
pub use traits::*;
pub use types::*;
