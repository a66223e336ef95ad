//! Rate limiter initialization.
//!
//! This module provides a minimum-interval rate limiter for spacing calls to a
//! single provider.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval rate limiter for one provider.
///
/// Calls issued through [`RateLimiter::wait`] are never closer together than
/// `1 / requests_per_second`.
///
/// # Behavior
///
/// - The last-call instant is guarded by an async mutex held across the sleep,
///   so concurrent callers queue on the lock and are spaced one interval apart
/// - No fairness guarantee beyond the mutex's own ordering
/// - Never fails, only delays
/// - A rate of 0 (or negative / non-finite) disables throttling
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Option<Duration>,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` calls per second.
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Some(Duration::from_secs_f64(1.0 / requests_per_second))
        } else {
            None
        };
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// A limiter that never delays.
    pub fn unlimited() -> Self {
        Self::new(0.0)
    }

    /// Configured spacing between calls, or `None` when throttling is disabled.
    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Suspends the caller until a call is allowed, then records the call.
    pub async fn wait(&self) {
        let Some(interval) = self.min_interval else {
            return;
        };

        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                let remaining = interval - elapsed;
                log::trace!("Rate limiter sleeping for {:?}", remaining);
                tokio::time::sleep(remaining).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

/// Initializes a shared rate limiter.
///
/// If `requests_per_second` is 0 the returned limiter is a no-op, so callers
/// can always hold one per provider without special-casing.
///
/// # Arguments
///
/// * `requests_per_second` - Maximum sustained call rate (0 disables rate limiting)
pub fn init_rate_limiter(requests_per_second: f64) -> Arc<RateLimiter> {
    let limiter = RateLimiter::new(requests_per_second);
    match limiter.min_interval() {
        Some(interval) => log::debug!(
            "Rate limiter initialized: {} req/s (min interval {:?})",
            requests_per_second,
            interval
        ),
        None => log::debug!("Rate limiting disabled"),
    }
    Arc::new(limiter)
}
