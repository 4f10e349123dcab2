//! Global upstream call throttle.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;

/// Default minimum gap between two upstream calls.
pub const DEFAULT_MIN_GAP: Duration = Duration::from_millis(2000);

/// Serializes upstream calls to at most one per `min_gap`, across all callers.
///
/// [`Throttle::acquire`] returns a permit; the gap is measured from the moment
/// the previous permit was dropped, so a slow upstream call pushes the next
/// one back accordingly.
pub struct Throttle {
    last_release: Mutex<Option<Instant>>,
    min_gap: Duration,
}

/// Exclusive right to make one upstream call.
///
/// Dropping the permit records the release time.
pub struct ThrottlePermit<'a> {
    guard: MutexGuard<'a, Option<Instant>>,
}

impl Drop for ThrottlePermit<'_> {
    fn drop(&mut self) {
        *self.guard = Some(Instant::now());
    }
}

impl Throttle {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            last_release: Mutex::new(None),
            min_gap,
        }
    }

    /// Configured minimum gap.
    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }

    /// Wait until the gap since the previous call has elapsed.
    pub async fn acquire(&self) -> ThrottlePermit<'_> {
        let guard = self.last_release.lock().await;

        if let Some(last) = *guard {
            let ready_at = last + self.min_gap;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                debug!(wait_ms = wait.as_millis() as u64, "Throttling upstream call");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        ThrottlePermit { guard }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_GAP)
    }
}
