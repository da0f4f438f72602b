//! Prometheus metrics exporter
//!
//! Renders the [`MetricsStore`] in the Prometheus text format on demand. No
//! global recorder is installed: each render builds a fresh recorder, replays
//! one consistent store snapshot into it and renders that.

use crate::metrics::recorder::{describe_metrics, record_build_info, record_snapshot};
use crate::metrics::store::MetricsStore;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;

/// Content type of the text exposition format
pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Metrics server configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics server
    pub listen_addr: SocketAddr,

    /// Path for metrics endpoint (default: "/metrics")
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            endpoint: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create a new config with custom address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Errors that can occur while serving metrics
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to bind metrics listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Metrics server failed: {0}")]
    Serve(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct MetricsExporter {
    store: Arc<MetricsStore>,
    version: &'static str,
}

impl MetricsExporter {
    pub fn new(store: Arc<MetricsStore>) -> Self {
        Self {
            store,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Render the current store contents
    pub fn render(&self) -> String {
        let snapshot = self.store.snapshot();
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_metrics();
            record_build_info(self.version);
            record_snapshot(&snapshot);
        });

        handle.render()
    }
}

/// Create an axum route serving the exporter
pub fn metrics_route(exporter: MetricsExporter) -> axum::routing::MethodRouter {
    axum::routing::get(serve_metrics).with_state(exporter)
}

async fn serve_metrics(State(exporter): State<MetricsExporter>) -> impl IntoResponse {
    ([(CONTENT_TYPE, TEXT_FORMAT)], exporter.render())
}
