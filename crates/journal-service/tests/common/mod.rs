//! Shared test harness: Ed25519 test keypairs, a mock JWKS server, and a
//! full journal service instance bound to a random port.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use journal_service::config::Config;
use journal_service::observability::metrics::init_metrics_recorder;
use journal_service::routes::{self, AppState};
use journal_service::services::Summarizer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::signature::{Ed25519KeyPair, KeyPair};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

pub fn get_test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Test keypair for signing tokens.
pub struct TestKeypair {
    pub kid: String,
    pub public_key_bytes: Vec<u8>,
    pub private_key_pkcs8: Vec<u8>,
}

impl TestKeypair {
    pub fn new(seed: u8, kid: &str) -> Self {
        // Create deterministic seed
        let mut seed_bytes = [0u8; 32];
        seed_bytes[0] = seed;
        for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
            *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
        }

        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
            .expect("Failed to create test keypair");

        let public_key_bytes = key_pair.public_key().as_ref().to_vec();
        let private_key_pkcs8 = build_pkcs8_from_seed(&seed_bytes);

        Self {
            kid: kid.to_string(),
            public_key_bytes,
            private_key_pkcs8,
        }
    }

    /// Sign arbitrary JSON claims into a JWT with this key's kid.
    pub fn sign_token(&self, claims: &serde_json::Value) -> String {
        let encoding_key = EncodingKey::from_ed_der(&self.private_key_pkcs8);
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone());

        encode(&header, claims, &encoding_key).expect("Failed to sign token")
    }

    /// Sign a token for `sub` expiring one hour from now.
    pub fn sign_user_token(&self, sub: &str) -> String {
        let now = Utc::now().timestamp();
        self.sign_token(&serde_json::json!({
            "sub": sub,
            "iat": now,
            "exp": now + 3600,
        }))
    }

    pub fn jwk_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "OKP",
            "kid": self.kid,
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode(&self.public_key_bytes),
            "alg": "EdDSA",
            "use": "sig"
        })
    }
}

/// Wrap an Ed25519 seed in a PKCS#8 v1 document (RFC 8410).
///
/// The prefix is SEQUENCE(46) / INTEGER 0 / AlgorithmIdentifier with the
/// Ed25519 OID 1.3.101.112 / OCTET STRING(34) wrapping the 32-byte seed
/// in an inner OCTET STRING.
pub fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    const PREFIX: [u8; 16] = [
        0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22,
        0x04, 0x20,
    ];

    let mut pkcs8 = Vec::with_capacity(PREFIX.len() + seed.len());
    pkcs8.extend_from_slice(&PREFIX);
    pkcs8.extend_from_slice(seed);
    pkcs8
}

/// Mount a JWKS endpoint serving the given keys on a mock server.
pub async fn mount_jwks(mock_server: &MockServer, keys: &[&TestKeypair]) {
    let jwks_response = serde_json::json!({
        "keys": keys.iter().map(|k| k.jwk_json()).collect::<Vec<_>>()
    });

    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&jwks_response))
        .mount(mock_server)
        .await;
}

/// Extra configuration knobs for a spawned test server.
#[derive(Default)]
pub struct TestServerOptions {
    pub dev_bypass_enabled: bool,
    pub expected_audience: Option<String>,
    pub expected_issuer: Option<String>,
}

/// Test server with mocked JWKS endpoint.
pub struct TestServer {
    pub addr: SocketAddr,
    server_handle: JoinHandle<()>,
    pub mock_server: MockServer,
    pub keypair: TestKeypair,
}

impl TestServer {
    pub async fn spawn(pool: PgPool) -> Result<Self> {
        Self::spawn_with(pool, TestServerOptions::default()).await
    }

    pub async fn spawn_with(pool: PgPool, options: TestServerOptions) -> Result<Self> {
        // Create mock JWKS server
        let mock_server = MockServer::start().await;
        let keypair = TestKeypair::new(1, "test-key-01");
        mount_jwks(&mock_server, &[&keypair]).await;

        // Build configuration pointing to mock JWKS server
        let mut vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "JWKS_URL".to_string(),
                format!("{}/.well-known/jwks.json", mock_server.uri()),
            ),
        ]);
        if options.dev_bypass_enabled {
            vars.insert("DEV_BYPASS_ENABLED".to_string(), "true".to_string());
        }
        if let Some(aud) = &options.expected_audience {
            vars.insert("EXPECTED_AUDIENCE".to_string(), aud.clone());
        }
        if let Some(iss) = &options.expected_issuer {
            vars.insert("EXPECTED_ISSUER".to_string(), iss.clone());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        // No LLM key in tests: summarization uses the extractive fallback
        let summarizer = Arc::new(Summarizer::new(
            config.llm_api_key.clone(),
            config.llm_api_url.clone(),
            config.llm_model.clone(),
            config.llm_max_tokens,
        ));

        let state = Arc::new(AppState {
            pool: pool.clone(),
            config,
            summarizer,
        });

        // Build routes with metrics handle
        let metrics_handle = get_test_metrics_handle();
        let app = routes::build_routes(state, metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let server_handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            server_handle,
            mock_server,
            keypair,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn create_valid_token(&self) -> String {
        self.keypair.sign_user_token("test-user")
    }

    pub fn create_expired_token(&self) -> String {
        let now = Utc::now().timestamp();
        self.keypair.sign_token(&serde_json::json!({
            "sub": "test-user",
            "iat": now - 7200,
            "exp": now - 3600,
        }))
    }

    /// Replace the JWKS response with a different key, so tokens signed
    /// with the original are no longer verifiable.
    pub async fn setup_missing_key(&self) {
        let different_keypair = TestKeypair::new(2, "different-key");

        self.mock_server.reset().await;
        mount_jwks(&self.mock_server, &[&different_keypair]).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}
