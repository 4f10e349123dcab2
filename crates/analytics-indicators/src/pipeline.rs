//! Enrichment pipeline: one pass that attaches every indicator column to a series.

use analytics_core::traits::{BarIndicator, Indicator};
use analytics_core::types::{BarSeries, EnrichedBar, EnrichedSeries, IndicatorValues};

use crate::momentum::{Macd, Rsi, Stochastic};
use crate::moving_average::{Ema, Sma};
use crate::volatility::{Atr, BollingerBands};
use crate::volume::{Obv, Vwap};

/// Fixed set of indicators computed for every fetched series.
#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    rsi: Rsi,
    sma_fast: Sma,
    sma_slow: Sma,
    ema_fast: Ema,
    ema_slow: Ema,
    macd: Macd,
    bollinger: BollingerBands,
    vwap: Vwap,
    atr: Atr,
    stochastic: Stochastic,
    obv: Obv,
}

impl Default for IndicatorPipeline {
    fn default() -> Self {
        Self {
            rsi: Rsi::new(14),
            sma_fast: Sma::new(20),
            sma_slow: Sma::new(50),
            ema_fast: Ema::new(12),
            ema_slow: Ema::new(26),
            macd: Macd::with_periods(12, 26, 9),
            bollinger: BollingerBands::with_params(20, 2.0),
            vwap: Vwap::new(),
            atr: Atr::new(14),
            stochastic: Stochastic::with_periods(14, 3),
            obv: Obv::new(),
        }
    }
}

impl IndicatorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrich a series with all indicator columns.
    ///
    /// Deterministic and side-effect free. Bars with insufficient lookback
    /// carry `None` for the affected columns.
    pub fn enrich(&self, series: &BarSeries) -> EnrichedSeries {
        let bars = series.bars();
        let closes = series.closes();

        let rsi = self.rsi.calculate(&closes);
        let sma_fast = self.sma_fast.calculate(&closes);
        let sma_slow = self.sma_slow.calculate(&closes);
        let ema_fast = self.ema_fast.calculate(&closes);
        let ema_slow = self.ema_slow.calculate(&closes);
        let macd = self.macd.calculate(&closes);
        let bollinger = self.bollinger.calculate(&closes);
        let vwap = self.vwap.calculate(bars);
        let atr = self.atr.calculate(bars);
        let stochastic = self.stochastic.calculate(bars);
        let obv = self.obv.calculate(bars);

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| EnrichedBar {
                bar: *bar,
                indicators: IndicatorValues {
                    rsi_14: rsi[i],
                    sma_20: sma_fast[i],
                    sma_50: sma_slow[i],
                    ema_12: ema_fast[i],
                    ema_26: ema_slow[i],
                    macd: macd[i].map(|m| m.macd),
                    macd_signal: macd[i].map(|m| m.signal),
                    macd_histogram: macd[i].map(|m| m.histogram),
                    bb_upper: bollinger[i].map(|b| b.upper),
                    bb_middle: bollinger[i].map(|b| b.middle),
                    bb_lower: bollinger[i].map(|b| b.lower),
                    vwap: vwap[i],
                    atr_14: atr[i],
                    stoch_k: stochastic[i].map(|s| s.k),
                    stoch_d: stochastic[i].and_then(|s| s.d),
                    obv: obv[i],
                },
            })
            .collect();

        EnrichedSeries {
            symbol: series.symbol.clone(),
            period: series.period,
            interval: series.interval,
            rows,
        }
    }
}

/// Enrich a series with the standard indicator set.
pub fn enrich(series: &BarSeries) -> EnrichedSeries {
    IndicatorPipeline::default().enrich(series)
}
