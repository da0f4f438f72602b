use crate::feed::{FeedSnapshot, OriginRecord};
use crate::peer::{CorrelationToken, Direction, SendError};
use crate::probe::rate_limiter::SkipReason;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Body of the probe message
pub const PROBE_BODY: &str = "!ping";

/// Upper bound for every engine timing setting (one week)
pub const MAX_PROBE_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Terminal state of one probe attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    TimedOut,
}

/// When a probe counts as answered
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// The probe's own event id must appear in a known peer's observations
    #[default]
    TokenExact,
    /// Any known peer appearing as a responder for the origin is enough
    KnownPeerPresence,
}

impl MatchRule {
    /// Whether `record` confirms `token` given the set of known peers
    pub fn matches(
        &self,
        record: &OriginRecord,
        token: &CorrelationToken,
        known_peers: &[String],
    ) -> bool {
        let mut responders = known_peers
            .iter()
            .filter_map(|peer| record.responder(peer));

        match self {
            MatchRule::TokenExact => responders.any(|pong| pong.has_token(token.as_str())),
            MatchRule::KnownPeerPresence => responders.next().is_some(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Room the probes are sent into
    pub room_id: String,
    /// Minimum spacing between two probes from the same peer
    pub ping_rate: Duration,
    /// How long a probe may stay unanswered before it counts as failed
    pub threshold: Duration,
    pub poll_interval: Duration,
    /// Wait after resolution before the final feed read
    pub settle_delay: Duration,
    pub match_rule: MatchRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            room_id: String::new(),
            ping_rate: Duration::from_secs(60),
            threshold: Duration::from_secs(240),
            poll_interval: Duration::from_secs(1),
            settle_delay: Duration::from_secs(5),
            match_rule: MatchRule::TokenExact,
        }
    }
}

impl EngineConfig {
    /// Spacing between scheduler rounds
    pub fn round_interval(&self) -> Duration {
        self.ping_rate.saturating_add(Duration::from_secs(1))
    }

    /// Name of the first timing setting above [`MAX_PROBE_DURATION`]
    pub fn oversized_setting(&self) -> Option<&'static str> {
        [
            ("ping_rate", self.ping_rate),
            ("threshold", self.threshold),
            ("poll_interval", self.poll_interval),
            ("settle_delay", self.settle_delay),
        ]
        .into_iter()
        .find(|(_, value)| *value > MAX_PROBE_DURATION)
        .map(|(name, _)| name)
    }
}

/// A sent probe waiting to be correlated
#[derive(Debug, Clone)]
pub struct ProbeAttempt {
    pub origin: String,
    pub direction: Direction,
    pub token: CorrelationToken,
    pub sent_at: Instant,
    pub deadline: Instant,
}

impl ProbeAttempt {
    /// Start the attempt now. The threshold is capped at
    /// [`MAX_PROBE_DURATION`].
    pub fn new(
        origin: impl Into<String>,
        direction: Direction,
        token: CorrelationToken,
        threshold: Duration,
    ) -> Self {
        let sent_at = Instant::now();
        Self {
            origin: origin.into(),
            direction,
            token,
            sent_at,
            deadline: sent_at + threshold.min(MAX_PROBE_DURATION),
        }
    }
}

/// Result of correlating one attempt against the feed
#[derive(Debug, Clone)]
pub struct Correlation {
    pub outcome: ProbeOutcome,
    /// Settled snapshot, or the last good one if the settle read failed
    pub snapshot: Option<FeedSnapshot>,
    /// Feed reads performed while waiting for a match
    pub polls: u32,
}

/// What happened when a peer was asked to probe
#[derive(Debug)]
pub enum Dispatch {
    Skipped(SkipReason),
    SendFailed(SendError),
    /// Probe sent; the handle resolves once the attempt is correlated and
    /// recorded
    Probing(JoinHandle<ProbeOutcome>),
}

impl Dispatch {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Dispatch::Skipped(_))
    }

    pub fn is_probing(&self) -> bool {
        matches!(self, Dispatch::Probing(_))
    }
}

/// Per-peer dispatch results of one round
#[derive(Debug, Default)]
pub struct RoundReport {
    pub dispatches: Vec<(String, Dispatch)>,
}

impl RoundReport {
    pub fn sent(&self) -> usize {
        self.dispatches.iter().filter(|(_, d)| d.is_probing()).count()
    }

    pub fn skipped(&self) -> usize {
        self.dispatches.iter().filter(|(_, d)| d.is_skipped()).count()
    }

    pub fn send_failures(&self) -> usize {
        self.dispatches
            .iter()
            .filter(|(_, d)| matches!(d, Dispatch::SendFailed(_)))
            .count()
    }

    /// Wait for every probe of this round to be resolved
    pub async fn outcomes(self) -> Vec<(String, ProbeOutcome)> {
        let mut outcomes = Vec::new();
        for (server, dispatch) in self.dispatches {
            if let Dispatch::Probing(handle) = dispatch {
                match handle.await {
                    Ok(outcome) => outcomes.push((server, outcome)),
                    Err(e) => tracing::error!(origin = %server, "Correlation task failed: {}", e),
                }
            }
        }
        outcomes
    }
}
