//! Global minimum-interval rate limiter for outbound upstream requests
//!
//! One limiter is shared by every ticker and every caller of a
//! `MarketDataClient`, so unrelated requests are serialized too.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces consecutive grants at least `min_interval` apart
///
/// Waiters queue on a FIFO-fair async mutex that is held across the wait,
/// so grants are handed out in arrival order.
pub struct RateLimiter {
    last_grant: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_grant: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until `min_interval` has passed since the previous grant, then
    /// records and returns the new grant instant
    pub async fn acquire(&self) -> Instant {
        let mut last_grant = self.last_grant.lock().await;

        if let Some(last) = *last_grant {
            let ready_at = last + self.min_interval;
            if ready_at > Instant::now() {
                tracing::debug!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Rate limiter: waiting before next upstream request"
                );
                sleep_until(ready_at).await;
            }
        }

        let granted = Instant::now();
        *last_grant = Some(granted);
        granted
    }

    /// Instant of the most recent grant, if any
    pub async fn last_grant(&self) -> Option<Instant> {
        *self.last_grant.lock().await
    }
}
