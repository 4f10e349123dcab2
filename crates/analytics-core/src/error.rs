//! Error types for the analytics service.

use thiserror::Error;

/// Errors reported by an upstream market data provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Upstream rate limit hit (too many requests)")]
    RateLimited,

    #[error("Symbol not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Whether the upstream asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited)
    }
}

/// Errors surfaced by the fetcher to its callers.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Upstream returned no data for the requested symbol/range.
    #[error("No data for {0}")]
    NotFound(String),

    /// Upstream failed, including a rate limit that survived the retry.
    #[error("Upstream error: {0}")]
    Upstream(ProviderError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<ProviderError> for FetchError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(symbol) => FetchError::NotFound(symbol),
            other => FetchError::Upstream(other),
        }
    }
}
