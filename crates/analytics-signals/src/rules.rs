//! Individual signal rules.

use analytics_core::types::{EnrichedBar, Judgment, Signal};
use analytics_core::round_dp;
use serde::{Deserialize, Serialize};

/// A rule that judges the most recent bar, optionally looking at the one before.
pub trait SignalRule: Send + Sync {
    /// Indicator name reported in the signal.
    fn name(&self) -> &str;

    /// Evaluate the rule, or `None` when its inputs are undefined.
    fn evaluate(&self, prev: &EnrichedBar, cur: &EnrichedBar) -> Option<Signal>;
}

/// RSI overbought/oversold rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsiRule {
    /// Buy below this level
    pub oversold: f64,
    /// Sell above this level
    pub overbought: f64,
}

impl Default for RsiRule {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl SignalRule for RsiRule {
    fn name(&self) -> &str {
        "RSI"
    }

    fn evaluate(&self, _prev: &EnrichedBar, cur: &EnrichedBar) -> Option<Signal> {
        let rsi = cur.indicators.rsi_14?;
        let (judgment, detail) = if rsi < self.oversold {
            (Judgment::Buy, format!("RSI {:.1}: oversold", rsi))
        } else if rsi > self.overbought {
            (Judgment::Sell, format!("RSI {:.1}: overbought", rsi))
        } else {
            (Judgment::Neutral, format!("RSI {:.1}: neutral", rsi))
        };
        Some(Signal::new(self.name(), judgment, Some(round_dp(rsi, 1)), detail))
    }
}

/// MACD line versus signal line, with crossover detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacdRule;

impl SignalRule for MacdRule {
    fn name(&self) -> &str {
        "MACD"
    }

    fn evaluate(&self, prev: &EnrichedBar, cur: &EnrichedBar) -> Option<Signal> {
        let macd = cur.indicators.macd?;
        let signal = cur.indicators.macd_signal?;
        let prev_macd = prev.indicators.macd?;
        let prev_signal = prev.indicators.macd_signal?;

        let (judgment, detail) = if prev_macd <= prev_signal && macd > signal {
            (Judgment::Buy, "Bullish crossover".to_string())
        } else if prev_macd >= prev_signal && macd < signal {
            (Judgment::Sell, "Bearish crossover".to_string())
        } else if macd > signal {
            (Judgment::Buy, "MACD above signal".to_string())
        } else {
            (Judgment::Sell, "MACD below signal".to_string())
        };
        Some(Signal::new(self.name(), judgment, Some(round_dp(macd, 4)), detail))
    }
}

/// Close touching or piercing the Bollinger bands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BollingerRule;

impl SignalRule for BollingerRule {
    fn name(&self) -> &str {
        "Bollinger"
    }

    fn evaluate(&self, _prev: &EnrichedBar, cur: &EnrichedBar) -> Option<Signal> {
        let upper = cur.indicators.bb_upper.filter(|v| *v != 0.0)?;
        let lower = cur.indicators.bb_lower.filter(|v| *v != 0.0)?;
        let price = cur.bar.close;

        let (judgment, detail) = if price >= upper {
            (Judgment::Sell, "Price at upper band")
        } else if price <= lower {
            (Judgment::Buy, "Price at lower band")
        } else {
            (Judgment::Neutral, "Price inside bands")
        };
        Some(Signal::new(self.name(), judgment, None, detail))
    }
}

/// Stochastic %K overbought/oversold rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochasticRule {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for StochasticRule {
    fn default() -> Self {
        Self {
            oversold: 20.0,
            overbought: 80.0,
        }
    }
}

impl SignalRule for StochasticRule {
    fn name(&self) -> &str {
        "Stochastic"
    }

    fn evaluate(&self, _prev: &EnrichedBar, cur: &EnrichedBar) -> Option<Signal> {
        let k = cur.indicators.stoch_k?;
        let (judgment, detail) = if k < self.oversold {
            (Judgment::Buy, format!("%K {:.1}: oversold", k))
        } else if k > self.overbought {
            (Judgment::Sell, format!("%K {:.1}: overbought", k))
        } else {
            (Judgment::Neutral, format!("%K {:.1}", k))
        };
        Some(Signal::new(self.name(), judgment, Some(round_dp(k, 1)), detail))
    }
}

/// Close relative to the session VWAP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VwapRule;

impl SignalRule for VwapRule {
    fn name(&self) -> &str {
        "VWAP"
    }

    fn evaluate(&self, _prev: &EnrichedBar, cur: &EnrichedBar) -> Option<Signal> {
        let vwap = cur.indicators.vwap.filter(|v| *v != 0.0)?;
        let price = cur.bar.close;

        let (judgment, detail) = if price > vwap {
            (Judgment::Buy, "Price above VWAP")
        } else {
            (Judgment::Sell, "Price below VWAP")
        };
        Some(Signal::new(self.name(), judgment, Some(round_dp(vwap, 2)), detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics_core::types::{Bar, IndicatorValues};

    fn row(close: f64, indicators: IndicatorValues) -> EnrichedBar {
        EnrichedBar {
            bar: Bar::new(0, close, close, close, close, 1.0),
            indicators,
        }
    }

    fn empty() -> EnrichedBar {
        row(100.0, IndicatorValues::default())
    }

    #[test]
    fn test_rsi_thresholds() {
        let rule = RsiRule::default();
        let at = |rsi: f64| {
            let cur = row(100.0, IndicatorValues { rsi_14: Some(rsi), ..Default::default() });
            rule.evaluate(&empty(), &cur).unwrap()
        };

        assert_eq!(at(25.34).judgment, Judgment::Buy);
        assert_eq!(at(25.34).value, Some(25.3));
        assert_eq!(at(30.0).judgment, Judgment::Neutral);
        assert_eq!(at(70.0).judgment, Judgment::Neutral);
        assert_eq!(at(70.1).judgment, Judgment::Sell);
        assert!(rule.evaluate(&empty(), &empty()).is_none());
    }

    #[test]
    fn test_macd_crossover_and_position() {
        let rule = MacdRule;
        let macd = |m: f64, s: f64| row(100.0, IndicatorValues { macd: Some(m), macd_signal: Some(s), ..Default::default() });

        let bullish = rule.evaluate(&macd(-0.1, 0.0), &macd(0.2, 0.1)).unwrap();
        assert_eq!(bullish.judgment, Judgment::Buy);
        assert_eq!(bullish.detail, "Bullish crossover");

        let bearish = rule.evaluate(&macd(0.1, 0.1), &macd(0.0, 0.1)).unwrap();
        assert_eq!(bearish.judgment, Judgment::Sell);
        assert_eq!(bearish.detail, "Bearish crossover");

        let above = rule.evaluate(&macd(0.3, 0.1), &macd(0.123456, 0.1)).unwrap();
        assert_eq!(above.judgment, Judgment::Buy);
        assert_eq!(above.detail, "MACD above signal");
        assert_eq!(above.value, Some(0.1235));

        assert!(rule.evaluate(&empty(), &macd(0.1, 0.0)).is_none());
    }

    #[test]
    fn test_bollinger_bounds_inclusive() {
        let rule = BollingerRule;
        let bands = |close: f64| row(close, IndicatorValues { bb_upper: Some(110.0), bb_lower: Some(90.0), ..Default::default() });

        assert_eq!(rule.evaluate(&empty(), &bands(110.0)).unwrap().judgment, Judgment::Sell);
        assert_eq!(rule.evaluate(&empty(), &bands(90.0)).unwrap().judgment, Judgment::Buy);
        let inside = rule.evaluate(&empty(), &bands(100.0)).unwrap();
        assert_eq!(inside.judgment, Judgment::Neutral);
        assert_eq!(inside.value, None);
    }

    #[test]
    fn test_bollinger_zero_band_skipped() {
        let cur = row(100.0, IndicatorValues { bb_upper: Some(110.0), bb_lower: Some(0.0), ..Default::default() });
        assert!(BollingerRule.evaluate(&empty(), &cur).is_none());
    }

    #[test]
    fn test_stochastic_thresholds() {
        let rule = StochasticRule::default();
        let at = |k: f64| {
            let cur = row(100.0, IndicatorValues { stoch_k: Some(k), ..Default::default() });
            rule.evaluate(&empty(), &cur).unwrap().judgment
        };

        assert_eq!(at(19.9), Judgment::Buy);
        assert_eq!(at(20.0), Judgment::Neutral);
        assert_eq!(at(80.0), Judgment::Neutral);
        assert_eq!(at(80.1), Judgment::Sell);
    }

    #[test]
    fn test_vwap_rule() {
        let at = |close: f64, vwap: f64| {
            let cur = row(close, IndicatorValues { vwap: Some(vwap), ..Default::default() });
            VwapRule.evaluate(&empty(), &cur)
        };

        let buy = at(101.0, 100.004).unwrap();
        assert_eq!(buy.judgment, Judgment::Buy);
        assert_eq!(buy.value, Some(100.0));
        assert_eq!(at(100.0, 100.0).unwrap().judgment, Judgment::Sell);
        assert!(at(100.0, 0.0).is_none());
    }
}
