//! Decimal rounding for values that leave the service.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round a float to `dp` decimal places, half to even, on its exact binary value.
///
/// `2.675` is stored as `2.67499999…` and therefore rounds to `2.67`.
/// Non-finite values are returned unchanged.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Round an optional float, keeping `None` as `None`.
#[inline]
pub fn round_opt(value: Option<f64>, dp: u32) -> Option<f64> {
    value.map(|v| round_dp(v, dp))
}
