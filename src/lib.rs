//! Federation probe exporter
//!
//! Measures message delivery latency across a federation of chat servers by
//! sending probe messages from every monitored peer, correlating them against
//! an external aggregation feed and exposing the results as Prometheus metrics.

pub mod api;
pub mod config;
pub mod feed;
pub mod matrix;
pub mod metrics;
pub mod peer;
pub mod probe;
