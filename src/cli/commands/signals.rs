//! Signals command implementation.

use analytics_config::AppConfig;
use analytics_core::types::{Interval, Period};
use analytics_signals::SignalEngine;
use anyhow::{anyhow, Context, Result};
use tracing::info;

use super::build_fetcher;
use crate::cli::SignalsArgs;

pub async fn run(args: SignalsArgs, config: AppConfig) -> Result<()> {
    let symbol = args.symbol.to_uppercase();
    let period: Period = args.period.parse().map_err(|e: String| anyhow!(e))?;
    let interval: Interval = args.interval.parse().map_err(|e: String| anyhow!(e))?;

    let fetcher = build_fetcher(&config, args.data_dir.as_deref())?;
    info!(symbol = %symbol, %period, %interval, "Evaluating signals");

    let series = fetcher
        .enriched(&symbol, period, interval)
        .await
        .with_context(|| format!("Failed to fetch {}", symbol))?;

    let engine = SignalEngine::standard();
    let report = engine.report(&symbol, &series);

    match args.output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("{} ({} bars, {} / {})", report.ticker, series.len(), period, interval);
            println!(
                "Overall: {} (buy {}, sell {}, neutral {})",
                report.overall, report.buy_count, report.sell_count, report.neutral_count
            );
            println!();
            for signal in &report.signals {
                let value = signal.value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
                println!("{:<12} {:<8} {:>12}  {}", signal.indicator, signal.judgment.to_string(), value, signal.detail);
            }
        }
    }

    Ok(())
}
