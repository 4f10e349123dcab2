//! Per-connection quote refresh loop.

use std::time::Duration;

use analytics_config::StreamSettings;
use analytics_core::error::FetchError;
use analytics_data::Fetcher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{error, warn};

use crate::broadcast::Broadcaster;

/// Payload pushed to stream subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteTick {
    pub ticker: String,
    pub price: f64,
    pub change: f64,
    pub change_pct: f64,
    pub volume: u64,
    pub high: f64,
    pub low: f64,
    pub rsi: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Latest tick for `symbol` from the cached quote and cached intraday RSI.
pub async fn quote_tick(fetcher: &Fetcher, symbol: &str) -> Result<QuoteTick, FetchError> {
    let quote = fetcher.quote(symbol).await?;
    Ok(QuoteTick {
        ticker: symbol.to_string(),
        price: quote.price,
        change: quote.change,
        change_pct: quote.change_percent,
        volume: quote.volume,
        high: quote.high,
        low: quote.low,
        rsi: fetcher.cached_rsi(symbol),
        timestamp: Utc::now(),
    })
}

/// Wait before the next refresh after `errors` consecutive failures.
pub fn backoff(settings: &StreamSettings, errors: u32) -> Duration {
    let secs = settings
        .base_interval_secs
        .saturating_mul(2u64.saturating_pow(errors))
        .min(settings.max_interval_secs);
    Duration::from_secs(secs)
}

/// Refresh and broadcast `symbol` until cancelled.
///
/// Failures back off exponentially; after `max_errors` in a row the loop
/// pauses for the cooldown and starts over. A keepalive restarts the
/// current wait without triggering a refresh.
pub async fn refresh_loop(
    fetcher: &Fetcher,
    broadcaster: &Broadcaster,
    symbol: &str,
    settings: &StreamSettings,
    keepalive: &Notify,
) {
    let mut errors: u32 = 0;

    loop {
        match quote_tick(fetcher, symbol).await {
            Ok(tick) => {
                match serde_json::to_string(&tick) {
                    Ok(payload) => {
                        broadcaster.broadcast(symbol, payload).await;
                    }
                    Err(e) => error!(symbol, error = %e, "Failed to encode tick"),
                }
                errors = 0;
            }
            Err(e) => {
                errors += 1;
                error!(symbol, errors, max_errors = settings.max_errors, error = %e, "WS refresh failed");

                if errors >= settings.max_errors {
                    warn!(
                        symbol,
                        cooldown_secs = settings.error_cooldown_secs,
                        "WS too many errors, backing off"
                    );
                    tokio::time::sleep(Duration::from_secs(settings.error_cooldown_secs)).await;
                    errors = 0;
                    continue;
                }
            }
        }

        let wait = backoff(settings, errors);
        loop {
            tokio::select! {
                _ = tokio::time::sleep(wait) => break,
                _ = keepalive.notified() => continue,
            }
        }
    }
}
