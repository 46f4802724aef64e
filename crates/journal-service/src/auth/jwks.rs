//! JWKS cache for fetching public keys from the identity provider.
//!
//! Keys are fetched from the provider's JWKS endpoint and cached for a
//! fixed TTL. Refreshes are conditional: when the provider returned an
//! `ETag`, the next refresh sends `If-None-Match` and a `304 Not Modified`
//! renews the cache without re-downloading key material.
//!
//! # Security
//!
//! - Keys are cached to reduce load on the provider and improve latency
//! - Cache expiry picks up key rotations; a forced refresh handles the
//!   rotation window where a new kid appears before the TTL elapses
//! - A provider outage degrades to last-known keys rather than locking
//!   every caller out

use crate::errors::AuthError;
use crate::observability::metrics::record_jwks_refresh;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Cache TTL (15 minutes).
const CACHE_TTL_SECONDS: u64 = 900;

/// Timeout for a single JWKS fetch.
const FETCH_TIMEOUT_SECONDS: u64 = 10;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" or "OKP").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm declared by the provider (e.g. "RS256", "EdDSA").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Curve name for OKP keys (always "Ed25519" for EdDSA).
    #[serde(default)]
    pub crv: Option<String>,

    /// OKP public key value (base64url encoded).
    #[serde(default)]
    pub x: Option<String>,
}

/// JWKS response from the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// Immutable key snapshot handed to callers, keyed by kid.
///
/// Snapshots are replaced wholesale on refresh and never mutated, so a
/// caller holding one sees a consistent key set for the whole lookup.
pub type KeySet = HashMap<String, Jwk>;

/// Cached JWKS data with expiry time and conditional-request validator.
struct CachedJwks {
    /// Snapshot of keys by kid.
    keys: Arc<KeySet>,

    /// When this cache entry expires.
    expires_at: Instant,

    /// ETag from the last 200 response, sent back as `If-None-Match`.
    validator: Option<String>,
}

/// Outcome of a single refresh attempt.
enum RefreshOutcome {
    /// 200 with a new key set.
    Updated,
    /// 304, key material unchanged.
    NotModified,
}

/// JWKS cache with TTL expiry and conditional refresh.
///
/// Thread-safe: readers take a short read lock on the cached snapshot;
/// refreshes are serialized behind a separate mutex so concurrent expired
/// readers ride on one in-flight fetch.
pub struct JwksCache {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Cached JWKS data.
    cache: RwLock<Option<CachedJwks>>,

    /// Serializes refreshes. Held across the network fetch; the cache
    /// RwLock is never held across await points.
    refresh_lock: Mutex<()>,

    /// Cache TTL duration.
    cache_ttl: Duration,
}

impl JwksCache {
    /// Create a new JWKS cache with the default 15 minute TTL.
    pub fn new(jwks_url: String) -> Self {
        Self::with_ttl(jwks_url, Duration::from_secs(CACHE_TTL_SECONDS))
    }

    /// Create a new JWKS cache with a custom TTL (for tests).
    pub fn with_ttl(jwks_url: String, cache_ttl: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "journal.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            cache_ttl,
        }
    }

    /// Get the current key set, refreshing if expired or forced.
    ///
    /// Performs at most one network fetch per call. When the fetch fails,
    /// the last-known key set is served even past its expiry; if the cache
    /// was never populated an empty set is returned so the caller reports
    /// an unknown signing key rather than a cache failure.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ConfigurationError` if no JWKS URL is configured.
    #[instrument(skip(self), fields(force = force))]
    pub async fn get(&self, force: bool) -> Result<Arc<KeySet>, AuthError> {
        if self.jwks_url.is_empty() {
            return Err(AuthError::ConfigurationError(
                "JWKS URL is not configured".to_string(),
            ));
        }

        // Fast path: unexpired cache and no forced refresh.
        if !force {
            if let Some(keys) = self.fresh_snapshot().await {
                tracing::debug!(target: "journal.auth.jwks", "JWKS cache hit");
                return Ok(keys);
            }
        }

        // Serialize refreshes. A caller that waited here re-checks the
        // cache first (unless forced): the refresh it waited on has
        // usually already done the work.
        let _guard = self.refresh_lock.lock().await;

        if !force {
            if let Some(keys) = self.fresh_snapshot().await {
                tracing::debug!(target: "journal.auth.jwks", "JWKS refreshed by concurrent caller");
                return Ok(keys);
            }
        }

        match self.refresh().await {
            Ok(outcome) => {
                match outcome {
                    RefreshOutcome::Updated => record_jwks_refresh("updated"),
                    RefreshOutcome::NotModified => record_jwks_refresh("not_modified"),
                }
                Ok(self.snapshot_or_empty().await)
            }
            Err(e) => {
                // A failed refresh never extends the stored expiry: the
                // next call will try the endpoint again. Serve what we
                // have so one provider blip does not lock everyone out.
                record_jwks_refresh("error");
                tracing::warn!(
                    target: "journal.auth.jwks",
                    error = %e,
                    "JWKS refresh failed, serving last-known keys"
                );
                Ok(self.snapshot_or_empty().await)
            }
        }
    }

    /// Return the cached snapshot if present and unexpired.
    async fn fresh_snapshot(&self) -> Option<Arc<KeySet>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.expires_at > Instant::now())
            .map(|cached| Arc::clone(&cached.keys))
    }

    /// Return whatever is cached, expired or not, or an empty key set.
    async fn snapshot_or_empty(&self) -> Arc<KeySet> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .map(|cached| Arc::clone(&cached.keys))
            .unwrap_or_else(|| Arc::new(KeySet::new()))
    }

    /// Perform one conditional fetch against the JWKS endpoint.
    ///
    /// Caller must hold `refresh_lock`.
    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<RefreshOutcome, AuthError> {
        let validator = {
            let cache = self.cache.read().await;
            cache.as_ref().and_then(|cached| cached.validator.clone())
        };

        tracing::debug!(
            target: "journal.auth.jwks",
            url = %self.jwks_url,
            conditional = validator.is_some(),
            "Fetching JWKS"
        );

        let mut request = self.http_client.get(&self.jwks_url);
        if let Some(etag) = &validator {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await.map_err(|e| {
            AuthError::FetchFailure(format!("Failed to fetch JWKS: {}", e))
        })?;

        if response.status() == StatusCode::NOT_MODIFIED {
            // Key material unchanged; renew the TTL on what we have.
            let mut cache = self.cache.write().await;
            if let Some(cached) = cache.as_mut() {
                cached.expires_at = Instant::now() + self.cache_ttl;
                tracing::debug!(target: "journal.auth.jwks", "JWKS not modified, TTL renewed");
                return Ok(RefreshOutcome::NotModified);
            }
            // A 304 without stored keys means the validator and the data
            // got out of sync. Treat it as a failed fetch.
            return Err(AuthError::FetchFailure(
                "JWKS endpoint returned 304 but no keys are cached".to_string(),
            ));
        }

        if !response.status().is_success() {
            return Err(AuthError::FetchFailure(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            AuthError::FetchFailure(format!("Failed to parse JWKS response: {}", e))
        })?;

        let keys: KeySet = jwks
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(
            target: "journal.auth.jwks",
            key_count = keys.len(),
            has_etag = etag.is_some(),
            "JWKS cache refreshed"
        );

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys: Arc::new(keys),
            expires_at: Instant::now() + self.cache_ttl,
            validator: etag,
        });

        Ok(RefreshOutcome::Updated)
    }
}
