use crate::feed::FeedPoller;
use crate::probe::types::{Correlation, MatchRule, ProbeAttempt, ProbeOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Matches sent probes against successive feed snapshots
pub struct OutcomeCorrelator {
    poller: Arc<dyn FeedPoller>,
    known_peers: Vec<String>,
    rule: MatchRule,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl OutcomeCorrelator {
    pub fn new(
        poller: Arc<dyn FeedPoller>,
        known_peers: Vec<String>,
        rule: MatchRule,
        poll_interval: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            poller,
            known_peers,
            rule,
            poll_interval,
            settle_delay,
        }
    }

    /// Poll the feed until the attempt is confirmed or its deadline passes,
    /// then wait for the feed to settle and read it once more.
    pub async fn correlate(&self, attempt: &ProbeAttempt) -> Correlation {
        let mut outcome = ProbeOutcome::TimedOut;
        let mut snapshot = None;
        let mut polls = 0u32;

        while Instant::now() < attempt.deadline {
            polls += 1;
            match self.poller.fetch().await {
                Ok(current) => {
                    let matched = match current.origin(&attempt.origin) {
                        Some(record) => {
                            self.rule
                                .matches(record, &attempt.token, &self.known_peers)
                        }
                        None => {
                            debug!(origin = %attempt.origin, "No feed record for origin yet");
                            false
                        }
                    };
                    snapshot = Some(current);

                    if matched {
                        info!(
                            origin = %attempt.origin,
                            token = %attempt.token,
                            elapsed_ms = attempt.sent_at.elapsed().as_millis() as u64,
                            "Probe confirmed by feed"
                        );
                        outcome = ProbeOutcome::Success;
                        break;
                    }
                }
                Err(e) => {
                    warn!(origin = %attempt.origin, "Failed to fetch feed: {}", e);
                }
            }

            let remaining = attempt.deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(self.poll_interval.min(remaining)).await;
        }

        if outcome == ProbeOutcome::TimedOut {
            error!(
                origin = %attempt.origin,
                token = %attempt.token,
                polls,
                "Probe not confirmed before deadline"
            );
        }

        // The feed publishes with a delay; give late observations a chance
        sleep(self.settle_delay).await;
        match self.poller.fetch().await {
            Ok(settled) => snapshot = Some(settled),
            Err(e) => warn!(origin = %attempt.origin, "Failed to fetch settled feed: {}", e),
        }

        Correlation {
            outcome,
            snapshot,
            polls,
        }
    }
}
