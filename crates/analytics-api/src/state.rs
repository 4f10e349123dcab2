//! Shared state of the route handlers.

use std::sync::Arc;
use std::time::Duration;

use analytics_config::{AppConfig, StreamSettings};
use analytics_data::Fetcher;
use analytics_monitor::ServiceMonitor;
use analytics_signals::SignalEngine;

use crate::broadcast::Broadcaster;
use crate::rate_limit::RateLimiter;

/// Services shared by every request and connection.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub signals: Arc<SignalEngine>,
    pub limiter: Arc<RateLimiter>,
    pub broadcaster: Arc<Broadcaster>,
    pub monitor: Arc<ServiceMonitor>,
    pub stream: Arc<StreamSettings>,
}

impl AppState {
    pub fn new(fetcher: Arc<Fetcher>, config: &AppConfig) -> Self {
        Self {
            fetcher,
            signals: Arc::new(SignalEngine::standard()),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit.limit,
                Duration::from_secs(config.rate_limit.window_secs),
            )),
            broadcaster: Arc::new(Broadcaster::new(Duration::from_secs(
                config.stream.send_timeout_secs,
            ))),
            monitor: Arc::new(ServiceMonitor::new()),
            stream: Arc::new(config.stream.clone()),
        }
    }
}
