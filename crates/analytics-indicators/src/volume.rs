//! Volume-weighted indicators.

use analytics_core::traits::BarIndicator;
use analytics_core::types::Bar;

use crate::momentum::guard_zero;

/// Volume Weighted Average Price, cumulative from the start of the series.
#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl BarIndicator for Vwap {
    type Output = f64;

    fn calculate(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let mut cum_pv = 0.0;
        let mut cum_vol = 0.0;

        bars.iter()
            .map(|bar| {
                cum_pv += bar.typical_price() * bar.volume;
                cum_vol += bar.volume;
                Some(cum_pv / guard_zero(cum_vol))
            })
            .collect()
    }

    fn period(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "VWAP"
    }
}

/// On-Balance Volume.
///
/// Running total of volume signed by the close-to-close direction.
#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl BarIndicator for Obv {
    type Output = f64;

    fn calculate(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let mut total = 0.0;

        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                if i > 0 {
                    let change = bar.close - bars[i - 1].close;
                    if change > 0.0 {
                        total += bar.volume;
                    } else if change < 0.0 {
                        total -= bar.volume;
                    }
                }
                Some(total)
            })
            .collect()
    }

    fn period(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "OBV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: f64, volume: f64) -> Bar {
        Bar::new(0, close, close, close, close, volume)
    }

    #[test]
    fn test_vwap_cumulative() {
        let bars = vec![bar(10.0, 100.0), bar(20.0, 300.0)];
        let result = Vwap::new().calculate(&bars);

        assert_eq!(result[0], Some(10.0));
        // (10*100 + 20*300) / 400 = 17.5
        assert!((result[1].unwrap() - 17.5).abs() < 1e-10);
    }

    #[test]
    fn test_vwap_zero_volume_is_zero_not_nan() {
        let result = Vwap::new().calculate(&[bar(10.0, 0.0)]);
        assert_eq!(result[0], Some(0.0));
    }

    #[test]
    fn test_obv_direction() {
        let bars = vec![
            bar(10.0, 100.0),
            bar(11.0, 50.0),
            bar(11.0, 70.0),
            bar(9.0, 30.0),
        ];
        let result = Obv::new().calculate(&bars);

        assert_eq!(result, vec![Some(0.0), Some(50.0), Some(50.0), Some(20.0)]);
    }
}
