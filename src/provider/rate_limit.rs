// =============================================================================
// Request Spacer — fixed minimum delay between provider calls
// =============================================================================
//
// Each caller reserves the next free slot under a short lock and then sleeps
// outside it, so concurrent tasks queue up one `delay` apart instead of all
// firing together.  A zero delay never sleeps.
// =============================================================================

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

pub struct RateLimiter {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
    requests: AtomicU32,
    delayed: AtomicU32,
}

/// Serialisable view of the limiter counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub delay_ms: u64,
    pub requests: u32,
    pub delayed: u32,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
            requests: AtomicU32::new(0),
            delayed: AtomicU32::new(0),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Wait until this caller's slot is due.
    pub async fn acquire(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let start = {
            let mut slot = self.next_slot.lock();
            let now = Instant::now();
            let start = match *slot {
                Some(due) if due > now => due,
                _ => now,
            };
            *slot = Some(start + self.delay);
            start
        };

        let wait = start.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            self.delayed.fetch_add(1, Ordering::Relaxed);
            debug!(wait_ms = wait.as_millis() as u64, "spacing provider request");
            tokio::time::sleep_until(start).await;
        }
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            delay_ms: self.delay.as_millis() as u64,
            requests: self.requests.load(Ordering::Relaxed),
            delayed: self.delayed.load(Ordering::Relaxed),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_millis(1000)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("delay", &self.delay)
            .field("requests", &self.requests.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_is_immediate() {
        let limiter = RateLimiter::from_millis(500);
        let start = std::time::Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(250));
        assert_eq!(limiter.snapshot().delayed, 0);
    }

    #[tokio::test]
    async fn consecutive_requests_are_spaced() {
        let limiter = RateLimiter::from_millis(40);
        let start = std::time::Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(80));
        let snap = limiter.snapshot();
        assert_eq!(snap.requests, 3);
        assert_eq!(snap.delayed, 2);
    }

    #[tokio::test]
    async fn zero_delay_never_waits() {
        let limiter = RateLimiter::from_millis(0);
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.snapshot().delayed, 0);
    }
}
