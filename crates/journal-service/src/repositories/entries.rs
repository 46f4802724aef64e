//! Entries repository for database operations.
//!
//! Every query is scoped by `user_id` so ownership is enforced at the SQL
//! level: an entry belonging to another user is indistinguishable from a
//! missing one.
//!
//! # Security
//!
//! - All queries use parameterized statements (SQL injection safe)
//! - Entry bodies are never logged

use crate::errors::JournalError;
use crate::models::Entry;
use crate::observability::metrics::record_db_query;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

/// Repository for journal entry operations.
pub struct EntriesRepository;

impl EntriesRepository {
    /// List a user's entries, newest first.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn list(pool: &PgPool, user_id: &str) -> Result<Vec<Entry>, JournalError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, user_id, title, body, ai_summary, created_at, updated_at
            FROM entries
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await;

        record_db_query(
            "list_entries",
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );

        Ok(result?)
    }

    /// Insert a new entry and return it.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn insert(
        pool: &PgPool,
        user_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Entry, JournalError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (user_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, body, ai_summary, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(body)
        .fetch_one(pool)
        .await;

        record_db_query(
            "insert_entry",
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );

        Ok(result?)
    }

    /// Fetch one entry by id, scoped to the owning user.
    ///
    /// Returns `None` for both a missing entry and an entry owned by
    /// someone else.
    #[instrument(skip_all, fields(entry_id = %entry_id))]
    pub async fn get(
        pool: &PgPool,
        user_id: &str,
        entry_id: Uuid,
    ) -> Result<Option<Entry>, JournalError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, user_id, title, body, ai_summary, created_at, updated_at
            FROM entries
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await;

        record_db_query(
            "get_entry",
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );

        Ok(result?)
    }

    /// Replace an entry's title and body, bumping `updated_at`.
    ///
    /// Returns `None` when no owned entry matched.
    #[instrument(skip_all, fields(entry_id = %entry_id))]
    pub async fn update(
        pool: &PgPool,
        user_id: &str,
        entry_id: Uuid,
        title: &str,
        body: &str,
    ) -> Result<Option<Entry>, JournalError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, Entry>(
            r#"
            UPDATE entries
            SET title = $3, body = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, body, ai_summary, created_at, updated_at
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .bind(title)
        .bind(body)
        .fetch_optional(pool)
        .await;

        record_db_query(
            "update_entry",
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );

        Ok(result?)
    }

    /// Delete an owned entry. Returns whether a row was removed.
    #[instrument(skip_all, fields(entry_id = %entry_id))]
    pub async fn delete(
        pool: &PgPool,
        user_id: &str,
        entry_id: Uuid,
    ) -> Result<bool, JournalError> {
        let start = Instant::now();
        let result = sqlx::query(
            r#"
            DELETE FROM entries
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .execute(pool)
        .await;

        record_db_query(
            "delete_entry",
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );

        Ok(result?.rows_affected() > 0)
    }

    /// Persist a generated summary on an owned entry.
    ///
    /// Returns `None` when no owned entry matched.
    #[instrument(skip_all, fields(entry_id = %entry_id))]
    pub async fn set_summary(
        pool: &PgPool,
        user_id: &str,
        entry_id: Uuid,
        summary: &str,
    ) -> Result<Option<Entry>, JournalError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, Entry>(
            r#"
            UPDATE entries
            SET ai_summary = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, body, ai_summary, created_at, updated_at
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .bind(summary)
        .fetch_optional(pool)
        .await;

        record_db_query(
            "set_summary",
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );

        Ok(result?)
    }
}
