//! Service uptime and health.

use std::time::{Duration, Instant};

use analytics_core::round_dp;
use serde::Serialize;

/// Body of the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    /// Seconds since start, one decimal
    pub uptime: f64,
    pub cache_size: usize,
    pub ws_connections: usize,
}

/// Tracks when the service started.
#[derive(Debug, Clone)]
pub struct ServiceMonitor {
    started: Instant,
}

impl Default for ServiceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMonitor {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Snapshot of the service state.
    pub fn report(&self, cache_size: usize, ws_connections: usize) -> HealthReport {
        HealthReport {
            status: "healthy",
            uptime: round_dp(self.uptime().as_secs_f64(), 1),
            cache_size,
            ws_connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_shape() {
        let monitor = ServiceMonitor::new();
        let report = monitor.report(12, 3);

        assert_eq!(report.status, "healthy");
        assert!(report.uptime >= 0.0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["cache_size"], 12);
        assert_eq!(json["ws_connections"], 3);
        assert!(json.get("uptime").is_some());
    }
}
