//! Per-peer probe rate limiting using the governor crate
//!
//! A peer may probe again once its rate window has passed and its previous
//! attempt has been resolved. The window cell is consumed when the permit is
//! taken, before anything goes on the wire.

use governor::{
    clock::Clock, middleware::NoOpMiddleware, state::keyed::HashMapStateStore, Quota, RateLimiter,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Clock driven by tokio's time source, so paused test time applies
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now().into_std()
    }
}

type KeyedLimiter = RateLimiter<
    String,
    HashMapStateStore<String>,
    TokioClock,
    NoOpMiddleware<std::time::Instant>,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Last probe was sent less than one rate window ago
    RateLimited,
    /// Previous attempt is still being correlated
    InFlight,
}

struct LimiterInner {
    window: KeyedLimiter,
    in_flight: Mutex<HashSet<String>>,
}

/// Rate limiter for probe dispatch, keyed by peer server name
#[derive(Clone)]
pub struct ProbeRateLimiter {
    inner: Arc<LimiterInner>,
}

impl ProbeRateLimiter {
    /// Returns `None` for a zero interval
    pub fn new(interval: Duration) -> Option<Self> {
        let quota = Quota::with_period(interval)?;
        Some(Self {
            inner: Arc::new(LimiterInner {
                window: RateLimiter::hashmap_with_clock(quota, &TokioClock),
                in_flight: Mutex::new(HashSet::new()),
            }),
        })
    }

    /// Take the right to probe from `peer` now
    pub fn try_acquire(&self, peer: &str) -> Result<ProbePermit, SkipReason> {
        let mut in_flight = self.inner.in_flight.lock();

        if in_flight.contains(peer) {
            return Err(SkipReason::InFlight);
        }

        let key = peer.to_string();
        if self.inner.window.check_key(&key).is_err() {
            return Err(SkipReason::RateLimited);
        }

        in_flight.insert(key.clone());
        Ok(ProbePermit {
            inner: self.inner.clone(),
            peer: key,
        })
    }

    pub fn is_in_flight(&self, peer: &str) -> bool {
        self.inner.in_flight.lock().contains(peer)
    }
}

/// Held for the lifetime of one probe attempt; releases the peer on drop
pub struct ProbePermit {
    inner: Arc<LimiterInner>,
    peer: String,
}

impl ProbePermit {
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl Drop for ProbePermit {
    fn drop(&mut self) {
        self.inner.in_flight.lock().remove(&self.peer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_rejected() {
        assert!(ProbeRateLimiter::new(Duration::ZERO).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_within_window_is_skipped() {
        let limiter = ProbeRateLimiter::new(Duration::from_secs(60)).unwrap();

        let permit = limiter.try_acquire("a.example").unwrap();
        assert_eq!(permit.peer(), "a.example");
        assert!(limiter.is_in_flight("a.example"));
        assert_eq!(
            limiter.try_acquire("a.example").err(),
            Some(SkipReason::InFlight)
        );

        drop(permit);
        assert!(!limiter.is_in_flight("a.example"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            limiter.try_acquire("a.example").err(),
            Some(SkipReason::RateLimited)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reopens() {
        let limiter = ProbeRateLimiter::new(Duration::from_secs(60)).unwrap();

        drop(limiter.try_acquire("a.example").unwrap());
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(limiter.try_acquire("a.example").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_boundary_is_exact() {
        let limiter = ProbeRateLimiter::new(Duration::from_secs(60)).unwrap();

        drop(limiter.try_acquire("a.example").unwrap());
        tokio::time::sleep(Duration::from_millis(59_999)).await;
        assert_eq!(
            limiter.try_acquire("a.example").err(),
            Some(SkipReason::RateLimited)
        );

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(limiter.try_acquire("a.example").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_blocks_after_window() {
        let limiter = ProbeRateLimiter::new(Duration::from_secs(60)).unwrap();

        let _permit = limiter.try_acquire("a.example").unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(
            limiter.try_acquire("a.example").err(),
            Some(SkipReason::InFlight)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_peers_are_independent() {
        let limiter = ProbeRateLimiter::new(Duration::from_secs(60)).unwrap();

        let _a = limiter.try_acquire("a.example").unwrap();
        let _b = limiter.try_acquire("b.example").unwrap();
        assert!(limiter.try_acquire("c.example").is_ok());
    }
}
