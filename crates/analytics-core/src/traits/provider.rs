//! Upstream market data provider trait.

use crate::error::ProviderError;
use crate::types::{BarSeries, Interval, Metadata, Period, SymbolMatch};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Third-party source of price history, metadata and symbol search.
///
/// Implementations are not expected to throttle or cache; the fetcher in
/// `analytics-data` owns both.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch OHLCV bars for one symbol.
    ///
    /// # Returns
    /// A series ordered from oldest to newest. An empty series is a valid
    /// answer; callers decide whether that means "not found".
    async fn history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<BarSeries, ProviderError>;

    /// Fetch the descriptive key/value bag for a symbol.
    async fn metadata(&self, symbol: &str) -> Result<Metadata, ProviderError>;

    /// Search symbols by free-text query.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>, ProviderError>;

    /// Fetch daily bars for several symbols in one logical call.
    ///
    /// Symbols without data are omitted from the result.
    async fn batch_daily_history(
        &self,
        symbols: &[String],
        period: Period,
    ) -> Result<BTreeMap<String, BarSeries>, ProviderError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}
