//! Aggregation feed access
//!
//! The feed is an independently maintained JSON document reporting, per
//! originating server, which probes have been answered by which servers and
//! the resulting round-trip statistics.

pub mod error;
pub mod poller;
pub mod types;

pub use error::{FetchError, FetchResult};
pub use poller::{FeedPoller, HttpFeedPoller};
pub use types::{FeedSnapshot, LatencyStats, OriginRecord, PongObservation};
