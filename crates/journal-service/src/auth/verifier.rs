//! Bearer token verification against the cached JWKS.
//!
//! The verifier resolves the token's kid against the key set, verifies the
//! signature with the algorithm the *key* declares (never the one the token
//! header claims), and validates audience, issuer, and expiry with zero
//! leeway.

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksCache};
use crate::errors::AuthError;
use crate::observability::metrics::record_token_verification;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::instrument;

/// Maximum JWT size in bytes, checked before any parsing.
///
/// Real tokens are well under 8KB; anything larger is garbage or abuse.
const MAX_JWT_SIZE_BYTES: usize = 8 * 1024;

/// User id attributed to the bare `dev` bypass token.
const DEV_BYPASS_USER_ID: &str = "dev-user";

/// Token verifier, selected once at construction.
///
/// The bypass variant only exists when `DEV_BYPASS_ENABLED` is set, so the
/// literal-token paths are unreachable in a production configuration.
pub enum TokenVerifier {
    /// Production path: every token goes through JWKS verification.
    Jwks(JwksVerifier),

    /// Development path: literal tokens `dev` and `user:<id>` short-circuit
    /// verification; everything else falls through to JWKS.
    DevBypass(JwksVerifier),
}

impl TokenVerifier {
    /// Build a verifier from configuration.
    pub fn new(
        jwks_url: String,
        expected_audience: Option<String>,
        expected_issuer: Option<String>,
        dev_bypass_enabled: bool,
    ) -> Self {
        let inner = JwksVerifier {
            jwks: Arc::new(JwksCache::new(jwks_url)),
            expected_audience,
            expected_issuer,
        };

        if dev_bypass_enabled {
            tracing::warn!(
                target: "journal.auth",
                "Development token bypass is ENABLED; do not run this configuration in production"
            );
            TokenVerifier::DevBypass(inner)
        } else {
            TokenVerifier::Jwks(inner)
        }
    }

    /// Verify a bearer token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns a typed `AuthError`; the HTTP layer collapses all of them
    /// to a generic 401.
    #[instrument(skip_all, name = "verify_token")]
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let result = match self {
            TokenVerifier::Jwks(verifier) => verifier.verify(token).await,
            TokenVerifier::DevBypass(verifier) => {
                if let Some(claims) = bypass_claims(token) {
                    tracing::warn!(
                        target: "journal.auth",
                        "Accepted development bypass token"
                    );
                    Ok(claims)
                } else {
                    verifier.verify(token).await
                }
            }
        };

        match &result {
            Ok(_) => record_token_verification("success"),
            Err(e) => record_token_verification(e.kind()),
        }
        result
    }
}

/// Synthesize claims for the development bypass literals.
///
/// `dev` maps to a fixed dev user; `user:<id>` maps to `<id>`. Anything
/// else (including `user:` with an empty id) is not a bypass token.
fn bypass_claims(token: &str) -> Option<Claims> {
    let user_id = match token {
        "dev" => DEV_BYPASS_USER_ID,
        _ => token.strip_prefix("user:").filter(|id| !id.is_empty())?,
    };

    let mut map = Map::new();
    map.insert("sub".to_string(), Value::String(user_id.to_string()));
    Some(Claims::from_map(map))
}

/// JWKS-backed verifier.
pub struct JwksVerifier {
    jwks: Arc<JwksCache>,
    expected_audience: Option<String>,
    expected_issuer: Option<String>,
}

impl JwksVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let kid = extract_kid(token)?;

        // Look up the kid; on a miss, force exactly one refresh in case
        // the provider rotated keys inside the TTL window.
        let keys = self.jwks.get(false).await?;
        let jwk = match keys.get(&kid) {
            Some(jwk) => jwk.clone(),
            None => {
                tracing::debug!(
                    target: "journal.auth",
                    kid = %kid,
                    "Key not found in cache, forcing JWKS refresh"
                );
                let keys = self.jwks.get(true).await?;
                keys.get(&kid)
                    .cloned()
                    .ok_or_else(|| AuthError::UnknownSigningKey(kid.clone()))?
            }
        };

        let algorithm = key_algorithm(&jwk)?;
        let decoding_key = decoding_key(&jwk)?;

        let mut validation = Validation::new(algorithm);
        // Zero leeway. The expiry boundary is inclusive: jsonwebtoken
        // treats exp == now as still valid, expired means exp < now.
        validation.leeway = 0;
        // exp is validated when present but a token without one is valid.
        validation.required_spec_claims.clear();
        // set_audience only assigns the expected values; validate_aud must
        // be toggled explicitly or the check is skipped entirely. The
        // library also lets a token without any aud claim through, so aud
        // becomes a required claim whenever an audience is configured.
        validation.validate_aud = self.expected_audience.is_some();
        if let Some(aud) = &self.expected_audience {
            validation.set_audience(&[aud]);
            validation.required_spec_claims.insert("aud".to_owned());
        }
        if let Some(iss) = &self.expected_issuer {
            validation.set_issuer(&[iss]);
        }

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(map_decode_error)?;

        Ok(token_data.claims)
    }
}

/// Extract the kid from a token header without verifying the signature.
fn extract_kid(token: &str) -> Result<String, AuthError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        return Err(AuthError::MalformedToken(format!(
            "Token exceeds maximum size of {} bytes",
            MAX_JWT_SIZE_BYTES
        )));
    }

    let header = decode_header(token)
        .map_err(|e| AuthError::MalformedToken(format!("Failed to parse token header: {}", e)))?;

    header
        .kid
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| AuthError::MalformedToken("Token header has no kid".to_string()))
}

/// The algorithm the key declares. The token header's alg is never
/// consulted, which closes the algorithm-confusion hole.
fn key_algorithm(jwk: &Jwk) -> Result<Algorithm, AuthError> {
    match jwk.alg.as_deref() {
        Some("RS256") => Ok(Algorithm::RS256),
        Some("RS384") => Ok(Algorithm::RS384),
        Some("RS512") => Ok(Algorithm::RS512),
        Some("EdDSA") => Ok(Algorithm::EdDSA),
        Some(other) => Err(AuthError::UnknownSigningKey(format!(
            "Key {} declares unsupported algorithm {}",
            jwk.kid, other
        ))),
        // No declared alg: fall back on the key type.
        None => match jwk.kty.as_str() {
            "RSA" => Ok(Algorithm::RS256),
            "OKP" => Ok(Algorithm::EdDSA),
            other => Err(AuthError::UnknownSigningKey(format!(
                "Key {} has unsupported key type {}",
                jwk.kid, other
            ))),
        },
    }
}

/// Build a decoding key from the JWK's public key material.
fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match jwk.kty.as_str() {
        "RSA" => {
            let (n, e) = match (&jwk.n, &jwk.e) {
                (Some(n), Some(e)) => (n, e),
                _ => {
                    return Err(AuthError::UnknownSigningKey(format!(
                        "RSA key {} is missing modulus or exponent",
                        jwk.kid
                    )))
                }
            };
            DecodingKey::from_rsa_components(n, e).map_err(|e| {
                AuthError::UnknownSigningKey(format!("RSA key {} is invalid: {}", jwk.kid, e))
            })
        }
        "OKP" => {
            if jwk.crv.as_deref() != Some("Ed25519") {
                return Err(AuthError::UnknownSigningKey(format!(
                    "OKP key {} has unsupported curve",
                    jwk.kid
                )));
            }
            let x = jwk.x.as_ref().ok_or_else(|| {
                AuthError::UnknownSigningKey(format!(
                    "OKP key {} is missing public key value",
                    jwk.kid
                ))
            })?;
            DecodingKey::from_ed_components(x).map_err(|e| {
                AuthError::UnknownSigningKey(format!("OKP key {} is invalid: {}", jwk.kid, e))
            })
        }
        other => Err(AuthError::UnknownSigningKey(format!(
            "Key {} has unsupported key type {}",
            jwk.kid, other
        ))),
    }
}

/// Map jsonwebtoken decode failures onto the auth error taxonomy.
fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience => AuthError::AudienceMismatch,
        // aud is the only claim ever marked required, and only when an
        // expected audience is configured.
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => AuthError::AudienceMismatch,
        ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::MalformedToken(err.to_string()),
        _ => AuthError::SignatureInvalid,
    }
}
