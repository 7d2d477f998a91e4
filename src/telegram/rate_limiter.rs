//! Pacing between consecutive calls.
//!
//! Telegram answers bursts of `phone.requestCall` with flood waits, so
//! consecutive calls are kept at least a fixed gap apart. The gap is measured
//! from the moment the previous call finished.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Rate limiter that enforces a minimum gap between operations.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum duration between the end of one operation and the next.
    min_interval: Duration,

    /// When the last operation finished.
    last_operation: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_operation: Mutex::new(None),
        }
    }

    /// Waits until the gap since the last finished operation has elapsed.
    ///
    /// Returns the duration waited (0 if no wait was needed).
    pub async fn wait_turn(&self) -> Duration {
        let wait_duration = self.time_until_allowed().await;

        if !wait_duration.is_zero() {
            debug!("Rate limiter: waiting {:?} before next call", wait_duration);
            tokio::time::sleep(wait_duration).await;
        }

        wait_duration
    }

    /// Records that an operation just finished.
    pub async fn mark_used(&self) {
        let mut last = self.last_operation.lock().await;
        *last = Some(Instant::now());
    }

    /// Returns the time remaining until the next operation is allowed.
    pub async fn time_until_allowed(&self) -> Duration {
        let last = self.last_operation.lock().await;
        match *last {
            Some(last_time) => self.min_interval.saturating_sub(last_time.elapsed()),
            None => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_first_operation() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        assert_eq!(limiter.time_until_allowed().await, Duration::ZERO);

        let waited = limiter.wait_turn().await;
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_rate_limiter_subsequent_operation() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        limiter.mark_used().await;

        let remaining = limiter.time_until_allowed().await;
        assert!(remaining > Duration::ZERO);
        assert!(remaining <= Duration::from_millis(100));

        let waited = limiter.wait_turn().await;
        assert!(waited > Duration::ZERO);
        assert_eq!(limiter.time_until_allowed().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_gap_counts_from_last_finish() {
        let limiter = RateLimiter::new(Duration::from_secs(60));

        limiter.mark_used().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.mark_used().await;

        assert!(limiter.time_until_allowed().await > Duration::from_secs(59));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let limiter = RateLimiter::new(Duration::ZERO);

        limiter.mark_used().await;

        assert_eq!(limiter.wait_turn().await, Duration::ZERO);
    }
}
