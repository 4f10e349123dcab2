//! CLI command implementations.

pub mod serve;
pub mod show;
pub mod signals;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use analytics_config::AppConfig;
use analytics_core::traits::MarketDataProvider;
use analytics_data::{CsvProvider, Fetcher, Throttle, TtlCache, YahooProvider};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Load the configuration file if it exists, else environment and defaults only.
pub fn load(config_path: &Path) -> Result<AppConfig> {
    let path = if config_path.exists() {
        Some(config_path)
    } else {
        None
    };
    let config = analytics_config::load_config(path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    Ok(config)
}

/// Fetcher over the configured provider, or over CSV files in `data_dir`.
pub fn build_fetcher(config: &AppConfig, data_dir: Option<&Path>) -> Result<Arc<Fetcher>> {
    let data_dir = data_dir.or_else(|| {
        (config.upstream.provider == "csv")
            .then_some(config.upstream.data_dir.as_deref())
            .flatten()
            .map(Path::new)
    });

    let provider: Arc<dyn MarketDataProvider> = match data_dir {
        Some(dir) => Arc::new(
            CsvProvider::new(dir)
                .with_context(|| format!("Failed to open data directory {}", dir.display()))?,
        ),
        None => Arc::new(YahooProvider::new(config.yahoo_config()).context("Failed to build HTTP client")?),
    };
    info!(provider = provider.name(), "Market data provider ready");

    if config.upstream.min_gap_ms < 1000 {
        warn!(min_gap_ms = config.upstream.min_gap_ms, "Upstream gap below 1s risks rate limiting");
    }

    Ok(Arc::new(Fetcher::new(
        provider,
        Arc::new(Throttle::new(config.min_gap())),
        Arc::new(TtlCache::new(config.cache.max_entries)),
        config.fetcher_settings(),
    )))
}
