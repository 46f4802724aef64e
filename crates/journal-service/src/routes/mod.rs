//! HTTP routes for the journal service.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::handlers;
use crate::middleware::auth::{require_user, AuthState};
use crate::middleware::http_metrics::http_metrics_middleware;
use crate::services::Summarizer;
use axum::http::{HeaderValue, Method};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,

    /// Service configuration.
    pub config: Config,

    /// Entry summarizer (LLM with extractive fallback).
    pub summarizer: Arc<Summarizer>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - public, unversioned
/// - `/ready` - Readiness probe (checks DB + JWKS config) - public, unversioned
/// - `/metrics` - Prometheus metrics endpoint - public, unversioned
/// - `/api/v1/entries` and children - entry CRUD + summarize (authenticated)
/// - TraceLayer for request logging
/// - CORS layer from the configured frontend origin
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    // Token verifier with its JWKS cache, shared by all protected routes
    let verifier = Arc::new(TokenVerifier::new(
        state.config.jwks_url.clone(),
        state.config.expected_audience.clone(),
        state.config.expected_issuer.clone(),
        state.config.dev_bypass_enabled,
    ));
    let auth_state = Arc::new(AuthState { verifier });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/api/v1/entries",
            get(handlers::list_entries).post(handlers::create_entry),
        )
        .route(
            "/api/v1/entries/:id",
            get(handlers::get_entry)
                .put(handlers::update_entry)
                .delete(handlers::delete_entry),
        )
        .route(
            "/api/v1/entries/:id/summarize",
            post(handlers::summarize_entry),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            require_user,
        ))
        .with_state(state.clone());

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CORS - browser access from the configured frontend origin
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer(&state.config.frontend_origin))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// CORS layer for the configured frontend origin.
///
/// `*` (the dev default) allows any origin; anything else must parse as a
/// header value or the layer falls back to permissive with a warning.
fn cors_layer(frontend_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if frontend_origin == "*" {
        return layer.allow_origin(Any);
    }

    match frontend_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(
                target: "journal.routes",
                origin = %frontend_origin,
                error = %e,
                "Invalid FRONTEND_ORIGIN, falling back to permissive CORS"
            );
            layer.allow_origin(Any)
        }
    }
}
