//! Multi-symbol comparison statistics.

use std::collections::{BTreeMap, BTreeSet};

use analytics_core::types::{BarSeries, ComparisonPoint, ComparisonReport, PerformanceStats};
use analytics_core::{round_dp, Period};
use statrs::statistics::Statistics;

/// Trading days per year used to annualise daily volatility.
pub const TRADING_DAYS: f64 = 252.0;

/// Close column of one symbol keyed by calendar date (`%Y-%m-%d`, UTC).
fn closes_by_date(series: &BarSeries) -> BTreeMap<String, f64> {
    series
        .bars()
        .iter()
        .map(|bar| (bar.datetime().format("%Y-%m-%d").to_string(), bar.close))
        .collect()
}

/// Relative change between consecutive values.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Pearson correlation of two equally long samples.
///
/// `None` when undefined (fewer than two points or a constant sample).
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let cov = a.iter().covariance(b.iter());
    let denom = a.iter().std_dev() * b.iter().std_dev();
    let corr = cov / denom;
    corr.is_finite().then_some(corr)
}

/// Annualised volatility in percent from a close series.
pub fn annualised_volatility(closes: &[f64]) -> f64 {
    let returns = pct_change(closes);
    if returns.len() < 2 {
        return 0.0;
    }
    let vol = returns.iter().std_dev() * TRADING_DAYS.sqrt() * 100.0;
    if vol.is_finite() {
        vol
    } else {
        0.0
    }
}

/// Build the comparison report for the requested symbols.
///
/// Symbols missing from `history` are left out. Closes are aligned on the
/// union of trading dates; each symbol is normalised to 100 at its first
/// close. Correlation uses daily returns on the dates where every symbol
/// has a return.
pub fn compare(tickers: &[String], period: Period, history: &BTreeMap<String, BarSeries>) -> ComparisonReport {
    let columns: Vec<(String, BTreeMap<String, f64>)> = tickers
        .iter()
        .filter_map(|sym| {
            let series = history.get(sym)?;
            let closes = closes_by_date(series);
            (!closes.is_empty()).then(|| (sym.clone(), closes))
        })
        .collect();

    let dates: BTreeSet<&String> = columns.iter().flat_map(|(_, c)| c.keys()).collect();

    // Normalised chart
    let bases: Vec<Option<f64>> = columns
        .iter()
        .map(|(_, c)| c.values().next().copied().filter(|b| *b != 0.0))
        .collect();

    let chart = dates
        .iter()
        .map(|date| {
            let values = columns
                .iter()
                .zip(bases.iter())
                .filter_map(|((sym, closes), base)| {
                    let close = closes.get(*date)?;
                    Some((sym.clone(), round_dp(close / (*base)? * 100.0, 2)))
                })
                .collect();
            ComparisonPoint {
                date: (*date).clone(),
                values,
            }
        })
        .collect();

    // Returns on rows where every symbol traded on both the row and the one before
    let dates: Vec<&String> = dates.into_iter().collect();
    let mut returns: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
    for pair in dates.windows(2) {
        let row: Option<Vec<f64>> = columns
            .iter()
            .map(|(_, c)| Some(c.get(pair[1])? / c.get(pair[0])? - 1.0))
            .collect();
        if let Some(row) = row {
            for (col, r) in returns.iter_mut().zip(row) {
                col.push(r);
            }
        }
    }

    let mut correlation = BTreeMap::new();
    for (i, (row_sym, _)) in columns.iter().enumerate() {
        let mut row = BTreeMap::new();
        for (j, (col_sym, _)) in columns.iter().enumerate() {
            let corr = pearson(&returns[i], &returns[j]).map(|c| round_dp(c, 4));
            row.insert(col_sym.clone(), corr);
        }
        correlation.insert(row_sym.clone(), row);
    }

    let performance = columns
        .iter()
        .filter_map(|(sym, closes)| {
            let values: Vec<f64> = closes.values().copied().collect();
            if values.len() < 2 {
                return None;
            }
            let start = values[0];
            let end = values[values.len() - 1];
            let stats = PerformanceStats {
                return_pct: round_dp((end / start - 1.0) * 100.0, 2),
                volatility_pct: round_dp(annualised_volatility(&values), 2),
                start: round_dp(start, 2),
                end: round_dp(end, 2),
                high: round_dp(values.iter().copied().fold(f64::NEG_INFINITY, f64::max), 2),
                low: round_dp(values.iter().copied().fold(f64::INFINITY, f64::min), 2),
            };
            Some((sym.clone(), stats))
        })
        .collect();

    ComparisonReport {
        tickers: tickers.to_vec(),
        period: period.to_string(),
        chart,
        correlation,
        performance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics_core::types::{Bar, Interval};

    const DAY_MS: i64 = 86_400_000;

    fn daily(symbol: &str, closes: &[f64]) -> BarSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64 * DAY_MS, c, c, c, c, 100.0))
            .collect();
        BarSeries::new(symbol, Period::Month3, Interval::Daily, bars)
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let a = [0.01, -0.02, 0.03, 0.005];
        let b: Vec<f64> = a.iter().map(|x| x * 2.0).collect();
        let neg: Vec<f64> = a.iter().map(|x| -x).collect();

        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-9);
        assert!((pearson(&a, &neg).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_constant_is_undefined() {
        assert_eq!(pearson(&[0.0, 0.0, 0.0], &[0.1, 0.2, 0.3]), None);
        assert_eq!(pearson(&[0.1], &[0.2]), None);
    }

    #[test]
    fn test_compare_normalises_to_100() {
        let tickers = vec!["AAA".to_string(), "BBB".to_string()];
        let mut history = BTreeMap::new();
        history.insert("AAA".to_string(), daily("AAA", &[50.0, 55.0, 60.0, 57.0]));
        history.insert("BBB".to_string(), daily("BBB", &[200.0, 190.0, 210.0, 220.0]));

        let report = compare(&tickers, Period::Month3, &history);

        assert_eq!(report.period, "3mo");
        assert_eq!(report.chart.len(), 4);
        assert_eq!(report.chart[0].values["AAA"], 100.0);
        assert_eq!(report.chart[0].values["BBB"], 100.0);
        assert_eq!(report.chart[2].values["AAA"], 120.0);

        let perf = &report.performance["AAA"];
        assert_eq!(perf.return_pct, 14.0);
        assert_eq!(perf.start, 50.0);
        assert_eq!(perf.end, 57.0);
        assert_eq!(perf.high, 60.0);
        assert_eq!(perf.low, 50.0);
        assert!(perf.volatility_pct > 0.0);

        assert_eq!(report.correlation["AAA"]["AAA"], Some(1.0));
        let ab = report.correlation["AAA"]["BBB"].unwrap();
        assert!((-1.0..=1.0).contains(&ab));
        assert_eq!(report.correlation["BBB"]["AAA"], Some(ab));
    }

    #[test]
    fn test_compare_skips_missing_symbols() {
        let tickers = vec!["AAA".to_string(), "ZZZ".to_string()];
        let mut history = BTreeMap::new();
        history.insert("AAA".to_string(), daily("AAA", &[1.0, 2.0]));

        let report = compare(&tickers, Period::Month1, &history);

        assert_eq!(report.tickers, tickers);
        assert!(report.performance.contains_key("AAA"));
        assert!(!report.performance.contains_key("ZZZ"));
        assert!(!report.correlation.contains_key("ZZZ"));
        // One return only: volatility is undefined and reported as 0
        assert_eq!(report.performance["AAA"].volatility_pct, 0.0);
    }
}
