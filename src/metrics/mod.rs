//! Metrics and observability module
//!
//! Keeps the latest probe results and renders them for Prometheus scraping.
//!
//! Series exposed:
//! - `federation_probe_mean`, `federation_probe_median`, `federation_probe_gmean`
//!   per (homeserver, origin, direction)
//! - `federation_probe_failures_total` per (origin, direction)
//! - `federation_probe_build_info`

pub mod exporter;
pub mod recorder;
pub mod store;

pub use exporter::{metrics_route, MetricsConfig, MetricsError, MetricsExporter};
pub use store::{FailureKey, MetricsSnapshot, MetricsStore, SampleKey};
