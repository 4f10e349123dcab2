//! Cached, throttled access to upstream market data.
//!
//! Every upstream call goes through the global [`Throttle`]; results land in
//! the shared [`TtlCache`] so concurrent features reuse one upstream fetch.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use analytics_core::error::{FetchError, ProviderError};
use analytics_core::traits::MarketDataProvider;
use analytics_core::types::{
    CompanyInfo, ComparisonReport, EnrichedSeries, Interval, MarketOverview, Metadata, Mover,
    Period, QuoteSnapshot, SymbolMatch,
};
use analytics_core::{round_dp, round_opt};
use analytics_indicators::{stats, IndicatorPipeline};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::policy::{keys, CachePolicy};
use crate::throttle::Throttle;

/// Values stored in the shared cache.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Series(Arc<EnrichedSeries>),
    Quote(Arc<QuoteSnapshot>),
    Info(Arc<CompanyInfo>),
    Search(Arc<Vec<SymbolMatch>>),
    Overview(Arc<MarketOverview>),
}

/// Fetcher tuning.
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub policy: CachePolicy,
    /// Pause before the single retry after an upstream rate limit
    pub rate_limit_cooldown: Duration,
    /// Index symbols of the market overview
    pub indices: Vec<String>,
    /// Large-cap symbols of the market overview
    pub mega_cap: Vec<String>,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            policy: CachePolicy::default(),
            rate_limit_cooldown: Duration::from_secs(30),
            indices: ["^GSPC", "^DJI", "^IXIC", "^BSESN", "^NSEI"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mega_cap: ["RELIANCE.NS", "TCS.NS", "HDFCBANK.NS", "INFY.NS", "SBIN.NS", "BHEL.NS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Orchestrates throttle, provider, enrichment and cache.
pub struct Fetcher {
    provider: Arc<dyn MarketDataProvider>,
    throttle: Arc<Throttle>,
    cache: Arc<TtlCache<CachedValue>>,
    pipeline: IndicatorPipeline,
    settings: FetcherSettings,
}

impl Fetcher {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        throttle: Arc<Throttle>,
        cache: Arc<TtlCache<CachedValue>>,
        settings: FetcherSettings,
    ) -> Self {
        Self {
            provider,
            throttle,
            cache,
            pipeline: IndicatorPipeline::default(),
            settings,
        }
    }

    /// Shared cache.
    pub fn cache(&self) -> &Arc<TtlCache<CachedValue>> {
        &self.cache
    }

    /// One throttled upstream call, retried once after a cooldown if upstream
    /// answers "too many requests".
    async fn call_upstream<T, F, Fut>(&self, what: &str, call: F) -> Result<T, ProviderError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        {
            let _permit = self.throttle.acquire().await;
            match call().await {
                Err(e) if e.is_rate_limited() => {}
                other => return other,
            }
        }

        warn!(
            call = what,
            cooldown_secs = self.settings.rate_limit_cooldown.as_secs(),
            "Upstream rate limited, retrying once after cooldown"
        );
        tokio::time::sleep(self.settings.rate_limit_cooldown).await;

        let _permit = self.throttle.acquire().await;
        call().await
    }

    /// One throttled upstream call with no retry.
    async fn call_once<T, Fut>(&self, call: Fut) -> Result<T, ProviderError>
    where
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let _permit = self.throttle.acquire().await;
        call.await
    }

    /// Enriched series for `(symbol, period, interval)`.
    pub async fn enriched(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Arc<EnrichedSeries>, FetchError> {
        let key = keys::series(symbol, period, interval);
        if let Some(CachedValue::Series(series)) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(series);
        }

        info!(symbol, %period, %interval, "Upstream history fetch");
        let series = self
            .call_upstream("history", || self.provider.history(symbol, period, interval))
            .await?;

        if series.is_empty() {
            return Err(FetchError::NotFound(symbol.to_string()));
        }

        let enriched = Arc::new(self.pipeline.enrich(&series));
        self.cache.set(
            key,
            CachedValue::Series(enriched.clone()),
            self.settings.policy.series_ttl(interval),
        );
        Ok(enriched)
    }

    /// Metadata bag, or an empty one if the call fails.
    async fn metadata_best_effort(&self, symbol: &str) -> Metadata {
        match self.call_once(self.provider.metadata(symbol)).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(symbol, error = %e, "Metadata unavailable");
                Metadata::new()
            }
        }
    }

    /// Latest price snapshot from a 5-day daily window.
    pub async fn quote(&self, symbol: &str) -> Result<Arc<QuoteSnapshot>, FetchError> {
        let key = keys::quote(symbol);
        if let Some(CachedValue::Quote(quote)) = self.cache.get(&key) {
            return Ok(quote);
        }

        info!(symbol, "Upstream quote fetch");
        let series = self
            .call_upstream("quote", || self.provider.history(symbol, Period::Day5, Interval::Daily))
            .await?;

        let bars = series.bars();
        let Some(last) = bars.last() else {
            return Err(FetchError::NotFound(symbol.to_string()));
        };
        let prev_close = if bars.len() > 1 {
            bars[bars.len() - 2].close
        } else {
            0.0
        };
        let price = last.close;
        let change = price - prev_close;
        let change_percent = if prev_close != 0.0 {
            change / prev_close * 100.0
        } else {
            0.0
        };

        let meta = self.metadata_best_effort(symbol).await;

        let quote = Arc::new(QuoteSnapshot {
            ticker: symbol.to_string(),
            price: round_dp(price, 2),
            change: round_dp(change, 2),
            change_percent: round_dp(change_percent, 2),
            open: round_dp(last.open, 2),
            high: round_dp(last.high, 2),
            low: round_dp(last.low, 2),
            prev_close: round_dp(prev_close, 2),
            volume: last.volume.max(0.0) as u64,
            market_cap: meta.get_u64("marketCap"),
            pe_ratio: meta.get_f64("trailingPE"),
            week_52_high: meta.get_f64("fiftyTwoWeekHigh"),
            week_52_low: meta.get_f64("fiftyTwoWeekLow"),
            timestamp: Utc::now(),
        });

        self.cache
            .set(key, CachedValue::Quote(quote.clone()), self.settings.policy.quote_ttl());
        Ok(quote)
    }

    /// Company profile; never fails.
    ///
    /// Only a profile built from a bag with `shortName` is cached.
    pub async fn company_info(&self, symbol: &str) -> Arc<CompanyInfo> {
        let key = keys::info(symbol);
        if let Some(CachedValue::Info(info)) = self.cache.get(&key) {
            return info;
        }

        let meta = match self.call_once(self.provider.metadata(symbol)).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(symbol, error = %e, "Company info unavailable");
                return Arc::new(CompanyInfo::unknown(symbol));
            }
        };

        if !meta.contains("shortName") {
            return Arc::new(CompanyInfo::unknown(symbol));
        }

        let info = Arc::new(CompanyInfo::from_metadata(symbol, &meta));
        self.cache
            .set(key, CachedValue::Info(info.clone()), self.settings.policy.info_ttl());
        info
    }

    /// Symbol search with a direct-lookup fallback; never fails.
    pub async fn search(&self, query: &str, limit: usize) -> Arc<Vec<SymbolMatch>> {
        let key = keys::search(query);
        if let Some(CachedValue::Search(results)) = self.cache.get(&key) {
            return results;
        }

        let results = match self.call_once(self.provider.search(query, limit)).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query, error = %e, "Search failed, trying direct lookup");
                self.direct_lookup(query).await
            }
        };

        let results = Arc::new(results);
        self.cache
            .set(key, CachedValue::Search(results.clone()), self.settings.policy.search_ttl());
        results
    }

    async fn direct_lookup(&self, query: &str) -> Vec<SymbolMatch> {
        let symbol = query.to_uppercase();
        match self
            .call_once(self.provider.history(&symbol, Period::Day1, Interval::Daily))
            .await
        {
            Ok(series) if !series.is_empty() => vec![SymbolMatch {
                name: symbol.clone(),
                symbol,
                exchange: None,
                kind: Some("EQUITY".to_string()),
            }],
            _ => Vec::new(),
        }
    }

    /// Normalised performance comparison of several symbols. Not cached.
    pub async fn compare(&self, symbols: &[String], period: Period) -> Result<ComparisonReport, FetchError> {
        info!(count = symbols.len(), %period, "Upstream batch fetch for comparison");
        let history = self
            .call_upstream("compare", || self.provider.batch_daily_history(symbols, period))
            .await?;

        if history.values().all(|s| s.is_empty()) {
            return Err(FetchError::NotFound("No data".to_string()));
        }

        Ok(stats::compare(symbols, period, &history))
    }

    /// Day-over-day moves of the configured baskets.
    ///
    /// Upstream failure yields an empty overview that is not cached.
    pub async fn market_overview(&self) -> Arc<MarketOverview> {
        if let Some(CachedValue::Overview(overview)) = self.cache.get(keys::MARKET_OVERVIEW) {
            return overview;
        }

        let all: Vec<String> = self
            .settings
            .indices
            .iter()
            .chain(self.settings.mega_cap.iter())
            .cloned()
            .collect();

        info!(count = all.len(), "Upstream batch fetch for market overview");
        let history = match self
            .call_upstream("overview", || self.provider.batch_daily_history(&all, Period::Day5))
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Market overview unavailable");
                return Arc::new(MarketOverview::default());
            }
        };

        let movers = |symbols: &[String]| -> Vec<Mover> {
            symbols
                .iter()
                .filter_map(|sym| {
                    let bars = history.get(sym)?.bars();
                    if bars.len() < 2 {
                        return None;
                    }
                    let price = bars[bars.len() - 1].close;
                    let prev = bars[bars.len() - 2].close;
                    if prev == 0.0 {
                        return None;
                    }
                    Some(Mover {
                        symbol: sym.clone(),
                        price: round_dp(price, 2),
                        change: round_dp(price - prev, 2),
                        change_pct: round_dp((price - prev) / prev * 100.0, 2),
                        volume: bars[bars.len() - 1].volume.max(0.0) as u64,
                    })
                })
                .collect()
        };

        let overview = Arc::new(MarketOverview {
            indices: movers(&self.settings.indices),
            mega_cap: movers(&self.settings.mega_cap),
        });

        self.cache.set(
            keys::MARKET_OVERVIEW,
            CachedValue::Overview(overview.clone()),
            self.settings.policy.overview_ttl(),
        );
        overview
    }

    /// Latest RSI of the cached 1d/5m series, rounded to 2 decimals.
    ///
    /// Reads the cache only; never triggers an upstream call.
    pub fn cached_rsi(&self, symbol: &str) -> Option<f64> {
        let key = keys::series(symbol, Period::Day1, Interval::Minute5);
        match self.cache.get(&key) {
            Some(CachedValue::Series(series)) => round_opt(series.last()?.indicators.rsi_14, 2),
            _ => None,
        }
    }
}
