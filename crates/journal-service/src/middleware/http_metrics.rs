//! Outermost middleware that times every HTTP response.
//!
//! Sits outside the router layers so that framework-generated responses
//! (404s, 405s, body-deserialization 400s, request timeouts) are counted
//! alongside handler responses.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Records method, normalized path, status, and duration for each request.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}
