//! Entry CRUD integration tests.
//!
//! Exercise the full stack (auth middleware, handlers, repository) against
//! a real database and a mocked JWKS endpoint.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use anyhow::Result;
use common::TestServer;
use sqlx::PgPool;

async fn create_entry(
    client: &reqwest::Client,
    server: &TestServer,
    token: &str,
    title: &str,
    body: &str,
) -> Result<serde_json::Value> {
    let response = client
        .post(format!("{}/api/v1/entries", server.url()))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"title": title, "body": body}))
        .send()
        .await?;

    assert_eq!(response.status(), 201);
    Ok(response.json().await?)
}

/// Create then fetch an entry.
#[sqlx::test(migrations = "../../migrations")]
async fn test_create_and_get_entry(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn(pool).await?;
    let client = reqwest::Client::new();
    let token = server.create_valid_token();

    let created = create_entry(&client, &server, &token, "Monday", "Went for a run.").await?;
    assert_eq!(created["title"], "Monday");
    assert_eq!(created["body"], "Went for a run.");
    assert!(created["ai_summary"].is_null());
    assert!(created["id"].is_string());
    // Owner is never serialized
    assert!(created.get("user_id").is_none());

    let response = client
        .get(format!("{}/api/v1/entries/{}", server.url(), created["id"].as_str().unwrap()))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let fetched: serde_json::Value = response.json().await?;
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["title"], "Monday");

    Ok(())
}

/// List returns the caller's entries newest first.
#[sqlx::test(migrations = "../../migrations")]
async fn test_list_entries_newest_first(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn(pool).await?;
    let client = reqwest::Client::new();
    let token = server.create_valid_token();

    create_entry(&client, &server, &token, "First", "one").await?;
    create_entry(&client, &server, &token, "Second", "two").await?;

    let response = client
        .get(format!("{}/api/v1/entries", server.url()))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let entries: serde_json::Value = response.json().await?;
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.first().unwrap()["title"], "Second");
    assert_eq!(entries.get(1).unwrap()["title"], "First");

    Ok(())
}

/// Validation failures return 400 with a specific message.
#[sqlx::test(migrations = "../../migrations")]
async fn test_create_entry_validation(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn(pool).await?;
    let client = reqwest::Client::new();
    let token = server.create_valid_token();

    let cases = vec![
        serde_json::json!({"title": "", "body": "body"}),
        serde_json::json!({"title": "   ", "body": "body"}),
        serde_json::json!({"title": "x".repeat(201), "body": "body"}),
        serde_json::json!({"title": "title", "body": ""}),
    ];

    for payload in cases {
        let response = client
            .post(format!("{}/api/v1/entries", server.url()))
            .header("Authorization", format!("Bearer {}", token))
            .json(&payload)
            .send()
            .await?;

        assert_eq!(response.status(), 400, "payload: {}", payload);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    Ok(())
}

/// Another user's entry is a 404, not a 403: existence never leaks.
#[sqlx::test(migrations = "../../migrations")]
async fn test_ownership_returns_not_found(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn(pool).await?;
    let client = reqwest::Client::new();

    let alice = server.keypair.sign_user_token("alice");
    let bob = server.keypair.sign_user_token("bob");

    let entry = create_entry(&client, &server, &alice, "Private", "alice only").await?;
    let entry_id = entry["id"].as_str().unwrap();

    // Read
    let response = client
        .get(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", bob))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    // Update
    let response = client
        .put(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", bob))
        .json(&serde_json::json!({"title": "Stolen", "body": "hacked"}))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    // Delete
    let response = client
        .delete(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", bob))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    // Summarize
    let response = client
        .post(format!("{}/api/v1/entries/{}/summarize", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", bob))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    // The entry is untouched for its owner
    let response = client
        .get(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", alice))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let fetched: serde_json::Value = response.json().await?;
    assert_eq!(fetched["title"], "Private");

    Ok(())
}

/// Update replaces title and body and bumps updated_at.
#[sqlx::test(migrations = "../../migrations")]
async fn test_update_entry(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn(pool).await?;
    let client = reqwest::Client::new();
    let token = server.create_valid_token();

    let entry = create_entry(&client, &server, &token, "Draft", "first attempt").await?;
    let entry_id = entry["id"].as_str().unwrap();

    let response = client
        .put(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"title": "Final", "body": "second attempt"}))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let updated: serde_json::Value = response.json().await?;
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["body"], "second attempt");
    assert_eq!(updated["created_at"], entry["created_at"]);

    Ok(())
}

/// Delete removes the entry and returns {"ok": true}.
#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_entry(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn(pool).await?;
    let client = reqwest::Client::new();
    let token = server.create_valid_token();

    let entry = create_entry(&client, &server, &token, "Temp", "delete me").await?;
    let entry_id = entry["id"].as_str().unwrap();

    let response = client
        .delete(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["ok"], true);

    // Gone now
    let response = client
        .get(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    // Deleting again is a 404
    let response = client
        .delete(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

/// Unknown entry ids are 404; non-UUID ids are rejected by routing.
#[sqlx::test(migrations = "../../migrations")]
async fn test_get_missing_entry(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn(pool).await?;
    let client = reqwest::Client::new();
    let token = server.create_valid_token();

    let response = client
        .get(format!(
            "{}/api/v1/entries/550e8400-e29b-41d4-a716-446655440000",
            server.url()
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!("{}/api/v1/entries/not-a-uuid", server.url()))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    assert_eq!(response.status(), 400);

    Ok(())
}

/// Summarize persists the summary and returns it. With no LLM key
/// configured the extractive fallback produces the first sentences.
#[sqlx::test(migrations = "../../migrations")]
async fn test_summarize_entry_fallback(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn(pool).await?;
    let client = reqwest::Client::new();
    let token = server.create_valid_token();

    let body_text = "Woke up early. Ran five miles. Made pancakes. Read all afternoon.";
    let entry = create_entry(&client, &server, &token, "Sunday", body_text).await?;
    let entry_id = entry["id"].as_str().unwrap();

    let response = client
        .post(format!("{}/api/v1/entries/{}/summarize", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(
        body["summary"],
        "Woke up early. Ran five miles. Made pancakes."
    );

    // The summary is persisted on the entry
    let response = client
        .get(format!("{}/api/v1/entries/{}", server.url(), entry_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    let fetched: serde_json::Value = response.json().await?;
    assert_eq!(
        fetched["ai_summary"],
        "Woke up early. Ran five miles. Made pancakes."
    );

    Ok(())
}
