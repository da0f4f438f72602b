//! Probe correlation engine
//!
//! Sends rate-limited probes from every peer, correlates them against the
//! aggregation feed and records the outcome in the [`MetricsStore`].
//!
//! Flow of one attempt:
//! - the rate limiter admits the peer (or the attempt is skipped)
//! - the probe is sent through the peer's session
//! - a correlation task polls the feed until the probe is seen or times out
//! - the outcome and the settled feed statistics land in the store
//!
//! [`MetricsStore`]: crate::metrics::MetricsStore

pub mod correlator;
pub mod dispatcher;
pub mod error;
pub mod rate_limiter;
pub mod scheduler;
pub mod types;

pub use correlator::OutcomeCorrelator;
pub use dispatcher::ProbeEngine;
pub use error::{EngineError, EngineResult};
pub use rate_limiter::{ProbePermit, ProbeRateLimiter, SkipReason, TokioClock};
pub use scheduler::RoundScheduler;
pub use types::{
    Correlation, Dispatch, EngineConfig, MatchRule, ProbeAttempt, ProbeOutcome, RoundReport,
    MAX_PROBE_DURATION, PROBE_BODY,
};
