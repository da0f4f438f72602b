use crate::metrics::{metrics_route, MetricsConfig, MetricsError, MetricsExporter};
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the scrape server: the metrics endpoint plus a health check
pub fn create_api_server(exporter: MetricsExporter, config: &MetricsConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(&config.endpoint, metrics_route(exporter))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

/// Bind `config.listen_addr` and serve until the process exits
pub async fn serve(exporter: MetricsExporter, config: MetricsConfig) -> Result<(), MetricsError> {
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|source| MetricsError::Bind {
            addr: config.listen_addr,
            source,
        })?;

    info!("Starting http server - {}", config.listen_addr);
    axum::serve(listener, create_api_server(exporter, &config)).await?;
    Ok(())
}
