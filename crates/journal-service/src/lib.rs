//! Journal Service Library
//!
//! This library provides the core functionality for the journal backend -
//! an HTTP API where authenticated users manage personal journal entries:
//!
//! - Bearer token verification against the identity provider's JWKS
//!   (conditional-refresh cache, key-declared algorithms)
//! - Entry CRUD over Postgres, scoped to the owning user
//! - AI summarization with an extractive fallback
//!
//! # Architecture
//!
//! The service follows the Handler -> Service -> Repository pattern:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - JWKS cache, token verifier, claims
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and metrics middleware
//! - `models` - Data models
//! - `observability` - Prometheus metrics helpers
//! - `repositories` - Database access
//! - `routes` - Axum router setup
//! - `services` - Summarizer

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
