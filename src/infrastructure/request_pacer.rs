//! Per-source request pacing
//!
//! Each collector owns one pacer so that consecutive requests to the same
//! retailer are at least `min_interval` apart. Backed by a `governor` direct
//! rate limiter with a burst of one.

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use std::time::Duration;

pub struct RequestPacer {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    min_interval: Duration,
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("min_interval", &self.min_interval)
            .finish()
    }
}

impl RequestPacer {
    /// A zero interval disables pacing
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval).map(RateLimiter::direct);
        Self { limiter, min_interval }
    }

    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next request may be sent
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_consecutive_requests_are_spaced() {
        let pacer = RequestPacer::new(Duration::from_millis(60));
        let started = Instant::now();
        pacer.ready().await;
        pacer.ready().await;
        pacer.ready().await;
        assert!(started.elapsed() >= Duration::from_millis(110));
    }

    #[tokio::test]
    async fn test_unpaced_does_not_wait() {
        let pacer = RequestPacer::unpaced();
        let started = Instant::now();
        for _ in 0..10 {
            pacer.ready().await;
        }
        assert!(started.elapsed() < Duration::from_millis(50));
        assert_eq!(pacer.min_interval(), Duration::ZERO);
    }
}
