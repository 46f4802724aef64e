//! Journal service error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Authentication failures deliberately collapse to a single generic 401
//! message so responses never reveal which verification step rejected the
//! token. The precise failure kind is logged server-side and recorded as a
//! metric label.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Generic message returned to clients for every authentication failure.
pub const GENERIC_AUTH_MESSAGE: &str = "The access token is invalid or expired";

/// Token verification failure kinds.
///
/// Every variant surfaces at the HTTP boundary as 401 with
/// [`GENERIC_AUTH_MESSAGE`]; the variant itself is only visible in logs
/// and metrics.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Verifier or cache misconfiguration (e.g. empty JWKS URL).
    #[error("Auth configuration error: {0}")]
    ConfigurationError(String),

    /// The JWKS endpoint could not be reached or returned an error.
    #[error("JWKS fetch failure: {0}")]
    FetchFailure(String),

    /// The token could not be parsed (bad structure, oversized, no kid).
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// No key with the token's kid exists, even after a forced refresh.
    #[error("Unknown signing key: {0}")]
    UnknownSigningKey(String),

    /// Signature verification failed against the selected key.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// The token's audience does not match the configured audience.
    #[error("Audience mismatch")]
    AudienceMismatch,

    /// The token's issuer does not match the configured issuer.
    #[error("Issuer mismatch")]
    IssuerMismatch,

    /// The token's exp claim is in the past.
    #[error("Token expired")]
    TokenExpired,

    /// Verified claims carry no recognized user identifier.
    #[error("No user identifier in claims")]
    NoUserIdentifier,
}

impl AuthError {
    /// Stable label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::ConfigurationError(_) => "configuration_error",
            AuthError::FetchFailure(_) => "fetch_failure",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::UnknownSigningKey(_) => "unknown_signing_key",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::TokenExpired => "token_expired",
            AuthError::NoUserIdentifier => "no_user_identifier",
        }
    }
}

/// Journal service error type.
///
/// Maps to HTTP status codes:
/// - Database, Internal: 500 Internal Server Error
/// - Unauthorized: 401 Unauthorized (always the generic message)
/// - NotFound: 404 Not Found
/// - BadRequest: 400 Bad Request
/// - ServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl JournalError {
    /// The HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            JournalError::Database(_) | JournalError::Internal => 500,
            JournalError::Unauthorized(_) => 401,
            JournalError::NotFound(_) => 404,
            JournalError::BadRequest(_) => 400,
            JournalError::ServiceUnavailable(_) => 503,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            JournalError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "journal.database", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            JournalError::Unauthorized(auth_err) => {
                // The kind stays in the log; the client sees one message
                // regardless of which verification step failed.
                tracing::debug!(
                    target: "journal.auth",
                    kind = auth_err.kind(),
                    error = %auth_err,
                    "Token verification failed"
                );
                (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    GENERIC_AUTH_MESSAGE.to_string(),
                )
            }
            JournalError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", resource.clone())
            }
            JournalError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            JournalError::ServiceUnavailable(reason) => {
                tracing::warn!(target: "journal.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            JournalError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"journal-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Convert sqlx errors to JournalError
impl From<sqlx::Error> for JournalError {
    fn from(err: sqlx::Error) -> Self {
        JournalError::Database(err.to_string())
    }
}
