//! Latest-value store for probe results
//!
//! Holds the last published latency statistics per (responder, origin,
//! direction) and a monotonically increasing failure counter per (origin,
//! direction). Writers and scrapes share one lock so a scrape always sees
//! whole writes.

use crate::feed::{FeedSnapshot, LatencyStats};
use crate::peer::Direction;
use crate::probe::ProbeOutcome;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SampleKey {
    pub responder: String,
    pub origin: String,
    pub direction: Direction,
}

impl SampleKey {
    pub fn new(
        responder: impl Into<String>,
        origin: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            responder: responder.into(),
            origin: origin.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FailureKey {
    pub origin: String,
    pub direction: Direction,
}

impl FailureKey {
    pub fn new(origin: impl Into<String>, direction: Direction) -> Self {
        Self {
            origin: origin.into(),
            direction,
        }
    }
}

/// Point-in-time copy of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub samples: BTreeMap<SampleKey, LatencyStats>,
    pub failures: BTreeMap<FailureKey, u64>,
}

#[derive(Debug, Default)]
struct StoreInner {
    samples: BTreeMap<SampleKey, LatencyStats>,
    failures: BTreeMap<FailureKey, u64>,
}

#[derive(Debug, Default)]
pub struct MetricsStore {
    inner: RwLock<StoreInner>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the terminal result of one probe attempt.
    ///
    /// A timeout adds one failure. Either way, every responder present in the
    /// snapshot's record for `origin` overwrites its sample; responders absent
    /// from the snapshot keep their previous values.
    pub fn record_outcome(
        &self,
        origin: &str,
        direction: Direction,
        outcome: ProbeOutcome,
        snapshot: Option<&FeedSnapshot>,
    ) {
        let mut inner = self.inner.write();

        if outcome == ProbeOutcome::TimedOut {
            *inner
                .failures
                .entry(FailureKey::new(origin, direction))
                .or_insert(0) += 1;
        }

        let Some(record) = snapshot.and_then(|s| s.origin(origin)) else {
            return;
        };

        for (responder, pong) in &record.pongs {
            inner
                .samples
                .insert(SampleKey::new(responder.as_str(), origin, direction), pong.stats());
        }
    }

    /// Count a probe that could not be sent at all
    pub fn record_send_failure(&self, origin: &str, direction: Direction) {
        let mut inner = self.inner.write();
        *inner
            .failures
            .entry(FailureKey::new(origin, direction))
            .or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.read();
        MetricsSnapshot {
            samples: inner.samples.clone(),
            failures: inner.failures.clone(),
        }
    }

    pub fn sample(
        &self,
        responder: &str,
        origin: &str,
        direction: Direction,
    ) -> Option<LatencyStats> {
        self.inner
            .read()
            .samples
            .get(&SampleKey::new(responder, origin, direction))
            .copied()
    }

    pub fn failures(&self, origin: &str, direction: Direction) -> u64 {
        self.inner
            .read()
            .failures
            .get(&FailureKey::new(origin, direction))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{OriginRecord, PongObservation};
    use std::sync::Arc;

    fn stats(v: f64) -> LatencyStats {
        LatencyStats {
            mean: v,
            median: v,
            gmean: v,
        }
    }

    fn snapshot_with(origin: &str, responders: &[(&str, f64)]) -> FeedSnapshot {
        let mut record = OriginRecord::default();
        for (server, v) in responders {
            record.pongs.insert(
                server.to_string(),
                PongObservation {
                    mean: *v,
                    median: *v,
                    gmean: *v,
                    ..Default::default()
                },
            );
        }
        let mut snapshot = FeedSnapshot::default();
        snapshot.pings.insert(origin.to_string(), record);
        snapshot
    }

    #[test]
    fn test_success_sets_samples_without_failure() {
        let store = MetricsStore::new();
        let feed = snapshot_with("a.example", &[("b.example", 120.0), ("c.example", 300.0)]);

        store.record_outcome("a.example", Direction::Outgoing, ProbeOutcome::Success, Some(&feed));

        assert_eq!(
            store.sample("b.example", "a.example", Direction::Outgoing),
            Some(stats(120.0))
        );
        assert_eq!(
            store.sample("c.example", "a.example", Direction::Outgoing),
            Some(stats(300.0))
        );
        assert_eq!(store.failures("a.example", Direction::Outgoing), 0);
    }

    #[test]
    fn test_second_round_overwrites() {
        let store = MetricsStore::new();
        let first = snapshot_with("b.example", &[("a.example", 100.0)]);
        let second = snapshot_with("b.example", &[("a.example", 900.0)]);

        let success = ProbeOutcome::Success;
        store.record_outcome("b.example", Direction::Incoming, success, Some(&first));
        store.record_outcome("b.example", Direction::Incoming, success, Some(&second));

        assert_eq!(
            store.sample("a.example", "b.example", Direction::Incoming),
            Some(stats(900.0))
        );
    }

    #[test]
    fn test_timeout_counts_once_and_keeps_stale_samples() {
        let store = MetricsStore::new();
        let earlier = snapshot_with("c.example", &[("a.example", 250.0)]);
        store.record_outcome(
            "c.example",
            Direction::Incoming,
            ProbeOutcome::Success,
            Some(&earlier),
        );

        store.record_outcome("c.example", Direction::Incoming, ProbeOutcome::TimedOut, None);
        store.record_outcome(
            "c.example",
            Direction::Incoming,
            ProbeOutcome::TimedOut,
            Some(&FeedSnapshot::default()),
        );

        assert_eq!(store.failures("c.example", Direction::Incoming), 2);
        assert_eq!(
            store.sample("a.example", "c.example", Direction::Incoming),
            Some(stats(250.0))
        );
    }

    #[test]
    fn test_timeout_still_applies_published_stats() {
        let store = MetricsStore::new();
        let feed = snapshot_with("c.example", &[("b.example", 42.0)]);

        store.record_outcome("c.example", Direction::Incoming, ProbeOutcome::TimedOut, Some(&feed));

        assert_eq!(store.failures("c.example", Direction::Incoming), 1);
        assert_eq!(
            store.sample("b.example", "c.example", Direction::Incoming),
            Some(stats(42.0))
        );
    }

    #[test]
    fn test_send_failure_counts() {
        let store = MetricsStore::new();
        store.record_send_failure("a.example", Direction::Outgoing);
        assert_eq!(store.failures("a.example", Direction::Outgoing), 1);
        assert_eq!(store.failures("a.example", Direction::Incoming), 0);
    }

    #[test]
    fn test_concurrent_writes_are_never_torn() {
        let store = Arc::new(MetricsStore::new());
        let mut handles = Vec::new();

        for writer in 0..8u32 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                let origin = format!("peer{writer}.example");
                for round in 0..200u32 {
                    let v = f64::from(writer * 1000 + round);
                    let feed = snapshot_with(&origin, &[("a.example", v), ("b.example", v)]);
                    let incoming = Direction::Incoming;
                    store.record_outcome(&origin, incoming, ProbeOutcome::Success, Some(&feed));
                    store.record_outcome(&origin, incoming, ProbeOutcome::TimedOut, None);
                }
            }));
        }

        let reader = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    let snap = store.snapshot();
                    for s in snap.samples.values() {
                        assert_eq!(s.mean, s.median);
                        assert_eq!(s.mean, s.gmean);
                    }
                }
            })
        };

        for h in handles {
            h.join().unwrap();
        }
        reader.join().unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.failures.len(), 8);
        assert!(snap.failures.values().all(|&n| n == 200));
        assert_eq!(snap.samples.len(), 16);
    }
}
