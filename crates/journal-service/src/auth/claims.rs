//! Verified token claims.
//!
//! Claims are kept as the full decoded JSON payload rather than a fixed
//! struct because identity providers disagree on which claim carries the
//! user identifier. The lookup order in [`USER_ID_CLAIMS`] is the
//! compatibility contract with those providers.

use crate::errors::AuthError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Claim names checked for the user identifier, in priority order.
///
/// `sub` is standard; `userID` and `userId` are vendor spellings some
/// providers emit instead. First non-empty string wins.
pub const USER_ID_CLAIMS: [&str; 3] = ["sub", "userID", "userId"];

/// Verified JWT claims.
///
/// Only constructed after signature and claim validation succeed (or by
/// the development bypass, which is explicit about doing so).
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Build a claims set from raw JSON map entries.
    ///
    /// Used by the development bypass to synthesize claims without a token.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Extract the user identifier from the claims.
    ///
    /// Checks the claim names in [`USER_ID_CLAIMS`] in order and returns
    /// the first non-empty string value.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoUserIdentifier` if none of the recognized
    /// claims holds a non-empty string.
    pub fn user_id(&self) -> Result<String, AuthError> {
        for claim in USER_ID_CLAIMS {
            if let Some(Value::String(value)) = self.0.get(claim) {
                if !value.is_empty() {
                    return Ok(value.clone());
                }
            }
        }
        Err(AuthError::NoUserIdentifier)
    }
}

/// Debug lists claim names only. Values may contain PII or token-scoped
/// secrets and must not reach logs.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("keys", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}
