//! Journal entry handlers.
//!
//! All handlers run behind the `require_user` middleware and operate only
//! on the authenticated user's entries. Missing entries and entries owned
//! by someone else produce the same 404 so existence never leaks.

use crate::errors::JournalError;
use crate::models::{DeleteResponse, Entry, EntryInput, SummaryResponse};
use crate::repositories::EntriesRepository;
use crate::routes::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

const ENTRY_NOT_FOUND: &str = "Entry not found";

/// `GET /api/v1/entries` - list the caller's entries, newest first.
#[instrument(skip_all, name = "journal.entries.list")]
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Entry>>, JournalError> {
    let entries = EntriesRepository::list(&state.pool, &user.user_id).await?;
    Ok(Json(entries))
}

/// `POST /api/v1/entries` - create an entry.
#[instrument(skip_all, name = "journal.entries.create")]
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<EntryInput>,
) -> Result<(StatusCode, Json<Entry>), JournalError> {
    input.validate()?;

    let entry =
        EntriesRepository::insert(&state.pool, &user.user_id, &input.title, &input.body).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// `GET /api/v1/entries/{id}` - fetch one entry.
#[instrument(skip_all, name = "journal.entries.get", fields(entry_id = %entry_id))]
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<Entry>, JournalError> {
    let entry = EntriesRepository::get(&state.pool, &user.user_id, entry_id)
        .await?
        .ok_or_else(|| JournalError::NotFound(ENTRY_NOT_FOUND.to_string()))?;

    Ok(Json(entry))
}

/// `PUT /api/v1/entries/{id}` - replace an entry's title and body.
#[instrument(skip_all, name = "journal.entries.update", fields(entry_id = %entry_id))]
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(input): Json<EntryInput>,
) -> Result<Json<Entry>, JournalError> {
    input.validate()?;

    let entry =
        EntriesRepository::update(&state.pool, &user.user_id, entry_id, &input.title, &input.body)
            .await?
            .ok_or_else(|| JournalError::NotFound(ENTRY_NOT_FOUND.to_string()))?;

    Ok(Json(entry))
}

/// `DELETE /api/v1/entries/{id}` - delete an entry.
#[instrument(skip_all, name = "journal.entries.delete", fields(entry_id = %entry_id))]
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, JournalError> {
    let deleted = EntriesRepository::delete(&state.pool, &user.user_id, entry_id).await?;

    if !deleted {
        return Err(JournalError::NotFound(ENTRY_NOT_FOUND.to_string()));
    }

    Ok(Json(DeleteResponse { ok: true }))
}

/// `POST /api/v1/entries/{id}/summarize` - summarize an entry's body and
/// persist the result.
#[instrument(skip_all, name = "journal.entries.summarize", fields(entry_id = %entry_id))]
pub async fn summarize_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, JournalError> {
    let entry = EntriesRepository::get(&state.pool, &user.user_id, entry_id)
        .await?
        .ok_or_else(|| JournalError::NotFound(ENTRY_NOT_FOUND.to_string()))?;

    let summary = state.summarizer.summarize(&entry.body).await;

    EntriesRepository::set_summary(&state.pool, &user.user_id, entry_id, &summary)
        .await?
        .ok_or_else(|| JournalError::NotFound(ENTRY_NOT_FOUND.to_string()))?;

    Ok(Json(SummaryResponse { summary }))
}
