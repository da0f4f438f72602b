use crate::feed::FeedPoller;
use crate::metrics::MetricsStore;
use crate::peer::{Peer, PeerRegistry};
use crate::probe::correlator::OutcomeCorrelator;
use crate::probe::error::{EngineError, EngineResult};
use crate::probe::rate_limiter::ProbeRateLimiter;
use crate::probe::types::{Dispatch, EngineConfig, ProbeAttempt, RoundReport};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Dispatches probes for the registered peers and records their outcomes
pub struct ProbeEngine {
    config: EngineConfig,
    registry: Arc<PeerRegistry>,
    store: Arc<MetricsStore>,
    limiter: ProbeRateLimiter,
    correlator: Arc<OutcomeCorrelator>,
}

impl ProbeEngine {
    pub fn new(
        config: EngineConfig,
        registry: Arc<PeerRegistry>,
        poller: Arc<dyn FeedPoller>,
        store: Arc<MetricsStore>,
    ) -> EngineResult<Self> {
        if config.room_id.is_empty() {
            return Err(EngineError::MissingRoom);
        }
        if config.threshold.is_zero() {
            return Err(EngineError::ZeroThreshold);
        }
        if let Some(setting) = config.oversized_setting() {
            return Err(EngineError::DurationTooLarge(setting));
        }
        let limiter = ProbeRateLimiter::new(config.ping_rate).ok_or(EngineError::ZeroPingRate)?;

        let correlator = OutcomeCorrelator::new(
            poller,
            registry.server_names(),
            config.match_rule,
            config.poll_interval,
            config.settle_delay,
        );

        Ok(Self {
            config,
            registry,
            store,
            limiter,
            correlator: Arc::new(correlator),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<MetricsStore> {
        &self.store
    }

    /// Probe from `peer` unless it is rate limited.
    ///
    /// Returns once the probe is sent (or skipped, or failed to send);
    /// correlation continues on its own task.
    pub async fn dispatch(&self, peer: &Peer) -> Dispatch {
        let permit = match self.limiter.try_acquire(&peer.server_name) {
            Ok(permit) => permit,
            Err(reason) => {
                debug!(
                    origin = %peer.server_name,
                    ?reason,
                    "Not sending probe, last one was less than {}s ago or still pending",
                    self.config.ping_rate.as_secs()
                );
                return Dispatch::Skipped(reason);
            }
        };

        let direction = peer.direction();
        info!(origin = %peer.server_name, %direction, "Sending probe");

        let token = match peer.session.send_probe(&self.config.room_id).await {
            Ok(token) => token,
            Err(e) => {
                error!(origin = %peer.server_name, "Failed to send probe: {}", e);
                self.store.record_send_failure(&peer.server_name, direction);
                return Dispatch::SendFailed(e);
            }
        };
        info!(origin = %peer.server_name, token = %token, "Sent probe");

        let attempt = ProbeAttempt::new(
            peer.server_name.clone(),
            direction,
            token,
            self.config.threshold,
        );
        let correlator = self.correlator.clone();
        let store = self.store.clone();

        let handle = tokio::spawn(async move {
            let correlation = correlator.correlate(&attempt).await;
            store.record_outcome(
                &attempt.origin,
                attempt.direction,
                correlation.outcome,
                correlation.snapshot.as_ref(),
            );
            drop(permit);
            correlation.outcome
        });

        Dispatch::Probing(handle)
    }

    /// Dispatch for every peer concurrently; returns when every peer has
    /// sent, skipped or failed to send.
    pub async fn run_round(&self) -> RoundReport {
        let dispatches = join_all(self.registry.iter().map(|peer| async move {
            (peer.server_name.clone(), self.dispatch(peer).await)
        }))
        .await;

        RoundReport { dispatches }
    }
}
