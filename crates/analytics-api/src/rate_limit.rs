//! Per-client sliding-window admission control.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Admits at most `limit` requests per client within any `window`.
pub struct RateLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    /// Record a request from `client` now, if it is within the limit.
    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    /// Record a request from `client` at `now`, if it is within the limit.
    pub fn allow_at(&self, client: &str, now: Instant) -> bool {
        let mut window = self.windows.entry(client.to_string()).or_default();

        while let Some(&oldest) = window.front() {
            if now.saturating_duration_since(oldest) > self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.limit {
            return false;
        }
        window.push_back(now);
        true
    }

    /// Clients currently tracked.
    pub fn client_count(&self) -> usize {
        self.windows.len()
    }

    /// Forget clients with no request inside the window.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window
                .back()
                .is_some_and(|&last| now.saturating_duration_since(last) <= self.window)
        });
        before - self.windows.len()
    }

    /// Periodically evict idle clients.
    pub fn spawn_janitor(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = limiter.evict_idle(Instant::now());
                if evicted > 0 {
                    debug!(evicted, remaining = limiter.client_count(), "Evicted idle clients");
                }
            }
        })
    }
}
