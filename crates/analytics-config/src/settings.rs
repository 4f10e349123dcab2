//! Configuration structures.

use std::time::Duration;

use analytics_data::{
    CachePolicy, FetcherSettings, YahooConfig, DEFAULT_BATCH_GAP, DEFAULT_CHART_URL, DEFAULT_COOKIE_URL,
    DEFAULT_SEARCH_URL,
};
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub market: MarketSettings,
}

impl AppConfig {
    /// Fetcher tuning derived from the cache, upstream and market sections.
    pub fn fetcher_settings(&self) -> FetcherSettings {
        FetcherSettings {
            policy: self.cache.ttl.clone(),
            rate_limit_cooldown: Duration::from_secs(self.upstream.rate_limit_cooldown_secs),
            indices: self.market.indices.clone(),
            mega_cap: self.market.mega_cap.clone(),
        }
    }

    pub fn yahoo_config(&self) -> YahooConfig {
        YahooConfig {
            chart_url: self.upstream.chart_url.clone(),
            search_url: self.upstream.search_url.clone(),
            cookie_url: self.upstream.cookie_url.clone(),
            timeout: Duration::from_secs(self.upstream.timeout_secs),
            batch_gap: Duration::from_millis(self.upstream.batch_gap_ms),
        }
    }

    /// Minimum gap between two upstream calls.
    pub fn min_gap(&self) -> Duration {
        Duration::from_millis(self.upstream.min_gap_ms)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        if self.server.port == 0 {
            problems.push("server.port must be non-zero".to_string());
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            problems.push(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                self.logging.format
            ));
        }
        match self.upstream.provider.as_str() {
            "yahoo" => {}
            "csv" if self.upstream.data_dir.is_some() => {}
            "csv" => problems.push("upstream.data_dir is required for the csv provider".to_string()),
            other => problems.push(format!("unknown upstream.provider \"{}\"", other)),
        }
        if self.upstream.timeout_secs == 0 {
            problems.push("upstream.timeout_secs must be positive".to_string());
        }
        if self.cache.max_entries == 0 {
            problems.push("cache.max_entries must be positive".to_string());
        }
        if self.rate_limit.limit == 0 || self.rate_limit.window_secs == 0 {
            problems.push("rate_limit.limit and rate_limit.window_secs must be positive".to_string());
        }
        if self.stream.base_interval_secs == 0 {
            problems.push("stream.base_interval_secs must be positive".to_string());
        }
        if self.stream.max_interval_secs < self.stream.base_interval_secs {
            problems.push("stream.max_interval_secs must not be below stream.base_interval_secs".to_string());
        }
        if self.stream.max_errors == 0 {
            problems.push("stream.max_errors must be positive".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "stock-analytics".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Directory for a daily-rolling log file
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Upstream market data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// `yahoo` or `csv`
    pub provider: String,
    /// CSV directory, required by the csv provider
    pub data_dir: Option<String>,
    pub min_gap_ms: u64,
    pub rate_limit_cooldown_secs: u64,
    pub chart_url: String,
    pub search_url: String,
    /// Page that sets the session cookie required for a crumb
    pub cookie_url: String,
    pub timeout_secs: u64,
    /// Pause between the per-symbol requests of one batch
    pub batch_gap_ms: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            provider: "yahoo".to_string(),
            data_dir: None,
            min_gap_ms: 2000,
            rate_limit_cooldown_secs: 30,
            chart_url: DEFAULT_CHART_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            timeout_secs: 15,
            batch_gap_ms: DEFAULT_BATCH_GAP.as_millis() as u64,
        }
    }
}

/// Response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_entries: usize,
    pub ttl: CachePolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 300,
            ttl: CachePolicy::default(),
        }
    }
}

/// Per-client admission control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub limit: usize,
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            limit: 60,
            window_secs: 60,
        }
    }
}

/// WebSocket refresh loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub base_interval_secs: u64,
    pub max_interval_secs: u64,
    /// Consecutive failures before the long cooldown
    pub max_errors: u32,
    pub error_cooldown_secs: u64,
    pub send_timeout_secs: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            base_interval_secs: 60,
            max_interval_secs: 300,
            max_errors: 5,
            error_cooldown_secs: 120,
            send_timeout_secs: 5,
        }
    }
}

/// Symbol baskets of the market overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub indices: Vec<String>,
    pub mega_cap: Vec<String>,
}

impl Default for MarketSettings {
    fn default() -> Self {
        let defaults = FetcherSettings::default();
        Self {
            indices: defaults.indices,
            mega_cap: defaults.mega_cap,
        }
    }
}
