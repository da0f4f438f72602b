use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate round-trip statistics in milliseconds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LatencyStats {
    pub mean: f64,
    pub median: f64,
    pub gmean: f64,
}

/// One responding server's view of an origin's probes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PongObservation {
    /// Probe event id -> observed delta in milliseconds
    #[serde(default)]
    pub diffs: HashMap<String, f64>,
    #[serde(default)]
    pub mean: f64,
    #[serde(default)]
    pub median: f64,
    #[serde(default)]
    pub gmean: f64,
}

impl PongObservation {
    pub fn stats(&self) -> LatencyStats {
        LatencyStats {
            mean: self.mean,
            median: self.median,
            gmean: self.gmean,
        }
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.diffs.contains_key(token)
    }
}

/// Everything the feed knows about probes from one origin
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OriginRecord {
    /// Responding server name -> observation
    #[serde(default)]
    pub pongs: HashMap<String, PongObservation>,
    #[serde(default)]
    pub mean: f64,
    #[serde(default)]
    pub median: f64,
    #[serde(default)]
    pub gmean: f64,
}

impl OriginRecord {
    pub fn responder(&self, server_name: &str) -> Option<&PongObservation> {
        self.pongs.get(server_name)
    }
}

/// One decoded fetch of the feed. Unknown fields are ignored and missing
/// origins simply mean "no data yet".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedSnapshot {
    #[serde(default)]
    pub pings: HashMap<String, OriginRecord>,
}

impl FeedSnapshot {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn origin(&self, server_name: &str) -> Option<&OriginRecord> {
        self.pings.get(server_name)
    }
}
