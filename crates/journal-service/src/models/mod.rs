//! Request and response types for the entries API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::JournalError;

/// Maximum title length in characters, matching the column definition.
pub const MAX_TITLE_CHARS: usize = 200;

/// Journal entry record from the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Entry {
    /// Entry ID.
    pub id: Uuid,
    /// Owner: the identity provider's subject string.
    #[serde(skip_serializing)]
    pub user_id: String,
    /// Entry title, at most 200 characters.
    pub title: String,
    /// Entry body text.
    pub body: String,
    /// Last generated AI summary, if any.
    pub ai_summary: Option<String>,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or replacing an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
    pub title: String,
    pub body: String,
}

impl EntryInput {
    /// Validate title and body against the storage constraints.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::BadRequest` describing the first violated rule.
    pub fn validate(&self) -> Result<(), JournalError> {
        if self.title.trim().is_empty() {
            return Err(JournalError::BadRequest(
                "Title must not be empty".to_string(),
            ));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(JournalError::BadRequest(format!(
                "Title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if self.body.trim().is_empty() {
            return Err(JournalError::BadRequest(
                "Body must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response body for `POST /entries/{id}/summarize`.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Response body for `DELETE /entries/{id}`.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

/// Response body for the readiness probe.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
