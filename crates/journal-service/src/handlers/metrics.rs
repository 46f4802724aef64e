//! Prometheus metrics endpoint handler.

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Serve the Prometheus metrics scrape endpoint.
///
/// Renders all recorded metrics in the Prometheus exposition format.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
