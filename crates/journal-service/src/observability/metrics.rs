//! Metrics definitions for the journal service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `journal_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: ~8 values (parameterized paths)
//! - `kind`: bounded by the auth error taxonomy
//! - `operation`: bounded by code (list_entries, insert_entry, etc.)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("journal_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("journal_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("journal_summarize".to_string()),
            &[0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000],
        )
        .map_err(|e| format!("Failed to set summarize buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `journal_http_requests_total`, `journal_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
///
/// This captures ALL HTTP responses including framework-level errors like:
/// - 415 Unsupported Media Type (wrong Content-Type)
/// - 400 Bad Request (JSON parse errors)
/// - 404 Not Found
/// - 405 Method Not Allowed
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    // Normalize endpoint to prevent cardinality explosion
    let normalized_endpoint = normalize_endpoint(endpoint);

    let status = categorize_status_code(status_code);

    histogram!("journal_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("journal_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// Replaces entry ids with placeholders.
fn normalize_endpoint(path: &str) -> String {
    // Known static paths
    match path {
        "/" => "/".to_string(),
        "/health" => "/health".to_string(),
        "/ready" => "/ready".to_string(),
        "/metrics" => "/metrics".to_string(),
        "/api/v1/entries" => "/api/v1/entries".to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Normalize entry paths with dynamic id segments.
fn normalize_dynamic_endpoint(path: &str) -> String {
    if path.starts_with("/api/v1/entries/") {
        let parts: Vec<&str> = path.split('/').collect();

        // /api/v1/entries/{id} → parts.len() == 5
        if parts.len() == 5 {
            return "/api/v1/entries/{id}".to_string();
        }

        // /api/v1/entries/{id}/summarize → parts.len() == 6
        if parts.len() == 6 && parts.get(5) == Some(&"summarize") {
            return "/api/v1/entries/{id}/summarize".to_string();
        }
    }

    // Unknown paths normalized to "/other" to bound cardinality
    "/other".to_string()
}

// ============================================================================
// Token Verification Metrics
// ============================================================================

/// Record a token verification outcome.
///
/// Metric: `journal_token_verifications_total`
/// Labels: `kind` ("success" or an auth error kind)
pub fn record_token_verification(kind: &str) {
    counter!("journal_token_verifications_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a JWKS refresh attempt.
///
/// Metric: `journal_jwks_refreshes_total`
/// Labels: `outcome` ("updated", "not_modified", "error")
pub fn record_jwks_refresh(outcome: &str) {
    counter!("journal_jwks_refreshes_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution
///
/// Metric: `journal_db_query_duration_seconds`, `journal_db_queries_total`
/// Labels: `operation`, `status`
///
/// Operations: list_entries, insert_entry, get_entry, update_entry,
///             delete_entry, set_summary
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("journal_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("journal_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Summarization Metrics
// ============================================================================

/// Record a summarization attempt.
///
/// Metric: `journal_summarize_duration_seconds`, `journal_summarizations_total`
/// Labels: `source` ("llm" or "fallback")
pub fn record_summarization(source: &str, duration: Duration) {
    histogram!("journal_summarize_duration_seconds",
        "source" => source.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("journal_summarizations_total",
        "source" => source.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================
