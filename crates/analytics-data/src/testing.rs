//! In-memory provider for tests and demos.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use analytics_core::error::ProviderError;
use analytics_core::traits::MarketDataProvider;
use analytics_core::types::{Bar, BarSeries, Interval, Metadata, Period, SymbolMatch};
use async_trait::async_trait;

/// Serves fixed bars, metadata and search results, and counts calls.
///
/// History ignores the requested period and interval and always returns
/// every bar registered for the symbol.
#[derive(Default)]
pub struct StaticProvider {
    bars: HashMap<String, Vec<Bar>>,
    metadata: HashMap<String, Metadata>,
    matches: Vec<SymbolMatch>,
    rate_limited: AtomicUsize,
    search_fails: AtomicBool,
    metadata_fails: AtomicBool,
    history_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
    search_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_metadata(mut self, symbol: &str, metadata: Metadata) -> Self {
        self.metadata.insert(symbol.to_string(), metadata);
        self
    }

    pub fn with_matches(mut self, matches: Vec<SymbolMatch>) -> Self {
        self.matches = matches;
        self
    }

    /// Fail the next `n` calls of any kind with [`ProviderError::RateLimited`].
    pub fn rate_limit_next(&self, n: usize) {
        self.rate_limited.store(n, Ordering::SeqCst);
    }

    /// Make every search call fail.
    pub fn fail_search(&self, fail: bool) {
        self.search_fails.store(fail, Ordering::SeqCst);
    }

    /// Make every metadata call fail.
    pub fn fail_metadata(&self, fail: bool) {
        self.metadata_fails.store(fail, Ordering::SeqCst);
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Calls of every kind.
    pub fn total_calls(&self) -> usize {
        self.history_calls() + self.metadata_calls() + self.search_calls() + self.batch_calls()
    }

    fn check_rate_limit(&self) -> Result<(), ProviderError> {
        let limited = self
            .rate_limited
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if limited {
            Err(ProviderError::RateLimited)
        } else {
            Ok(())
        }
    }

    fn series(&self, symbol: &str, period: Period, interval: Interval) -> BarSeries {
        let bars = self.bars.get(symbol).cloned().unwrap_or_default();
        BarSeries::new(symbol, period, interval, bars)
    }
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    async fn history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<BarSeries, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.check_rate_limit()?;
        Ok(self.series(symbol, period, interval))
    }

    async fn metadata(&self, symbol: &str) -> Result<Metadata, ProviderError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.check_rate_limit()?;
        if self.metadata_fails.load(Ordering::SeqCst) {
            return Err(ProviderError::Http("metadata unavailable".to_string()));
        }
        Ok(self.metadata.get(symbol).cloned().unwrap_or_default())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_rate_limit()?;
        if self.search_fails.load(Ordering::SeqCst) {
            return Err(ProviderError::Http("search unavailable".to_string()));
        }
        let needle = query.to_lowercase();
        Ok(self
            .matches
            .iter()
            .filter(|m| m.symbol.to_lowercase().contains(&needle) || m.name.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn batch_daily_history(
        &self,
        symbols: &[String],
        period: Period,
    ) -> Result<BTreeMap<String, BarSeries>, ProviderError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_rate_limit()?;
        Ok(symbols
            .iter()
            .map(|s| (s.clone(), self.series(s, period, Interval::Daily)))
            .filter(|(_, series)| !series.is_empty())
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}
