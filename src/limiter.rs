//! Minimum-interval rate limiting shared by every fetch path.
//!
//! One timestamp, one mutex. The check-sleep-record sequence runs as a
//! single critical section so two workers arriving together cannot both slip
//! inside the delay window. Share the limiter with `Arc` when several
//! sessions (or pool workers) must honor one global delay.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum interval between outbound requests.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Limiter enforcing the given minimum interval. A zero delay records
    /// timestamps but never sleeps.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// The enforced minimum interval.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Block until at least `delay` has elapsed since the last recorded
    /// request, then record a new timestamp. The very first call proceeds
    /// immediately. The guard is held across the sleep: concurrent callers
    /// queue up and each observes the previous caller's timestamp.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay {
                let pause = self.delay - elapsed;
                debug!(pause_ms = pause.as_millis() as u64, "rate limit pause");
                tokio::time::sleep(pause).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Record the current instant without sleeping. Used by operations that
    /// time the delay from response completion rather than request start.
    pub async fn record_now(&self) {
        *self.last_request.lock().await = Some(Instant::now());
    }
}
