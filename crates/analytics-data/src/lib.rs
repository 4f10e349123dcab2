//! Market data access for the analytics service.
//!
//! Upstream calls are serialised through one [`Throttle`], and their results
//! are kept in a shared [`TtlCache`] by the [`Fetcher`].

mod cache;
mod csv_source;
mod fetcher;
mod policy;
mod throttle;
mod yahoo;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{TtlCache, DEFAULT_MAX_ENTRIES};
pub use csv_source::CsvProvider;
pub use fetcher::{CachedValue, Fetcher, FetcherSettings};
pub use policy::{keys, CachePolicy};
pub use throttle::{Throttle, ThrottlePermit, DEFAULT_MIN_GAP};
pub use yahoo::{
    YahooConfig, YahooProvider, DEFAULT_BATCH_GAP, DEFAULT_CHART_URL, DEFAULT_COOKIE_URL, DEFAULT_SEARCH_URL,
};
