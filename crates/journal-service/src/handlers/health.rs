//! Liveness and readiness probe handlers.
//!
//! `/health` answers as long as the process can schedule a task; `/ready`
//! additionally verifies the dependencies the API needs to serve traffic.

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe. Checks no dependencies on purpose: a failure here
/// means the process itself is wedged and should be restarted.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe: 200 when the service can take traffic, 503 otherwise.
///
/// Pings the database and verifies a JWKS endpoint is configured. Keys
/// themselves are fetched on demand and cached, so readiness does not
/// call the provider. The response body stays generic; the concrete
/// failure is logged server-side only.
#[tracing::instrument(skip_all, name = "journal.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_check = sqlx::query("SELECT 1").fetch_one(&state.pool).await;

    if let Err(e) = db_check {
        tracing::warn!("Readiness check failed: database error: {}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: Some("unhealthy"),
                jwks: None,
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    // The JWKS client fetches and caches keys on demand; readiness only
    // verifies the endpoint is configured.
    if state.config.jwks_url.is_empty() {
        tracing::warn!("Readiness check failed: JWKS URL not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: Some("healthy"),
                jwks: Some("unavailable"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            database: Some("healthy"),
            jwks: Some("configured"),
            error: None,
        }),
    )
}
