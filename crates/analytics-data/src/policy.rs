//! Cache keys and time-to-live per resource kind.

use std::time::Duration;

use analytics_core::types::{Interval, Period};
use serde::{Deserialize, Serialize};

/// TTLs applied by the fetcher, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
    /// 1m and 5m series
    pub intraday_secs: u64,
    /// 15m and 30m series
    pub medium_secs: u64,
    /// Every other interval
    pub daily_secs: u64,
    pub quote_secs: u64,
    pub search_secs: u64,
    pub overview_secs: u64,
    pub info_secs: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            intraday_secs: 30,
            medium_secs: 90,
            daily_secs: 180,
            quote_secs: 60,
            search_secs: 300,
            overview_secs: 120,
            info_secs: 600,
        }
    }
}

impl CachePolicy {
    /// TTL of an enriched series fetched at `interval`.
    pub fn series_ttl(&self, interval: Interval) -> Duration {
        let secs = match interval {
            Interval::Minute1 | Interval::Minute5 => self.intraday_secs,
            Interval::Minute15 | Interval::Minute30 => self.medium_secs,
            _ => self.daily_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_secs)
    }

    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn overview_ttl(&self) -> Duration {
        Duration::from_secs(self.overview_secs)
    }

    pub fn info_ttl(&self) -> Duration {
        Duration::from_secs(self.info_secs)
    }
}

/// Composite cache keys.
pub mod keys {
    use super::{Interval, Period};

    pub const MARKET_OVERVIEW: &str = "market:overview";

    pub fn series(symbol: &str, period: Period, interval: Interval) -> String {
        format!("df:{}:{}:{}", symbol, period, interval)
    }

    pub fn quote(symbol: &str) -> String {
        format!("quote:{}", symbol)
    }

    pub fn info(symbol: &str) -> String {
        format!("info:{}", symbol)
    }

    pub fn search(query: &str) -> String {
        format!("search:{}", query.to_lowercase())
    }
}
