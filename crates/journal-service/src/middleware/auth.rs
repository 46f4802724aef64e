//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, verifies it
//! through the token verifier, resolves the user identifier, and injects
//! an [`AuthUser`] into request extensions for downstream handlers.

use crate::auth::TokenVerifier;
use crate::errors::{AuthError, JournalError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Token verifier backed by the JWKS cache.
    pub verifier: Arc<TokenVerifier>,
}

/// Authenticated user, resolved from verified token claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The identity provider's subject string for this user.
    pub user_id: String,
}

/// Extract Bearer token from the Authorization header.
fn extract_bearer_token(req: &Request) -> Result<&str, JournalError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "journal.middleware.auth", "Missing Authorization header");
            JournalError::Unauthorized(AuthError::MalformedToken(
                "Missing Authorization header".to_string(),
            ))
        })?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "journal.middleware.auth", "Invalid Authorization header format");
        JournalError::Unauthorized(AuthError::MalformedToken(
            "Invalid Authorization header format".to_string(),
        ))
    })
}

/// Authentication middleware for user-facing endpoints.
///
/// # Response
///
/// - Returns 401 Unauthorized if the token is missing or fails verification
/// - Continues to the next handler with [`AuthUser`] in extensions otherwise
#[instrument(skip_all, name = "journal.middleware.auth")]
pub async fn require_user(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, JournalError> {
    let token = extract_bearer_token(&req)?;

    let claims = state.verifier.verify(token).await?;
    let user_id = claims.user_id()?;

    // Store the resolved user in request extensions for downstream handlers
    req.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(req).await)
}
