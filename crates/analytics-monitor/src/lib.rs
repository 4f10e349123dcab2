//! Logging setup and service health reporting.

mod health;
mod logging;

pub use health::{HealthReport, ServiceMonitor};
pub use logging::{setup_logging, LOG_FILE_PREFIX};
