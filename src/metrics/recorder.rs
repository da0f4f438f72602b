//! Emits the store contents through the `metrics` facade
//!
//! Must be called with a recorder in scope; the exporter installs a
//! short-lived local recorder for every scrape.

use crate::metrics::store::MetricsSnapshot;
use metrics::{counter, describe_counter, describe_gauge, gauge};

pub const MEAN: &str = "federation_probe_mean";
pub const MEDIAN: &str = "federation_probe_median";
pub const GMEAN: &str = "federation_probe_gmean";
pub const FAILURES: &str = "federation_probe_failures_total";
pub const BUILD_INFO: &str = "federation_probe_build_info";

/// Metric descriptions
pub fn describe_metrics() {
    describe_gauge!(MEAN, "Mean ping time in milliseconds");
    describe_gauge!(MEDIAN, "Median ping time in milliseconds");
    describe_gauge!(GMEAN, "Geometric mean ping time in milliseconds");
    describe_counter!(FAILURES, "Probes that were not sent or not answered in time");
    describe_gauge!(BUILD_INFO, "Build information of the exporter");
}

/// Record every sample and counter in `snapshot`
pub fn record_snapshot(snapshot: &MetricsSnapshot) {
    for (key, stats) in &snapshot.samples {
        let labels = [
            ("homeserver", key.responder.clone()),
            ("origin", key.origin.clone()),
            ("direction", key.direction.as_str().to_string()),
        ];
        gauge!(MEAN, &labels).set(stats.mean);
        gauge!(MEDIAN, &labels).set(stats.median);
        gauge!(GMEAN, &labels).set(stats.gmean);
    }

    for (key, count) in &snapshot.failures {
        counter!(
            FAILURES,
            "origin" => key.origin.clone(),
            "direction" => key.direction.as_str()
        )
        .absolute(*count);
    }
}

/// Record the build info gauge
pub fn record_build_info(version: &'static str) {
    gauge!(BUILD_INFO, "version" => version).set(1.0);
}
