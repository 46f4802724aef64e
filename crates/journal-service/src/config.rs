//! Journal service configuration.
//!
//! Configuration is loaded from environment variables. Sensitive fields
//! (database URL, LLM API key) are redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default OpenAI-compatible chat completions endpoint for summarization.
pub const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model used for entry summarization.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Default completion token budget for summaries.
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 256;

/// Journal service configuration.
///
/// Loaded from environment variables with sensible defaults for everything
/// except `DATABASE_URL` and `JWKS_URL`, which are required.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Identity provider JWKS endpoint for token verification.
    pub jwks_url: String,

    /// Expected token audience. Enforced only when set.
    pub expected_audience: Option<String>,

    /// Expected token issuer. Enforced only when set.
    pub expected_issuer: Option<String>,

    /// Whether the literal-token development bypass is enabled.
    /// Must never be true in production deployments.
    pub dev_bypass_enabled: bool,

    /// Allowed CORS origin for the frontend (default: "*").
    pub frontend_origin: String,

    /// API key for the LLM summarization endpoint. Extractive fallback
    /// is used when unset.
    pub llm_api_key: Option<String>,

    /// Chat completions endpoint URL (overridable for tests).
    pub llm_api_url: String,

    /// Model name for summarization requests.
    pub llm_model: String,

    /// Completion token budget for summaries.
    pub llm_max_tokens: u32,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("jwks_url", &self.jwks_url)
            .field("expected_audience", &self.expected_audience)
            .field("expected_issuer", &self.expected_issuer)
            .field("dev_bypass_enabled", &self.dev_bypass_enabled)
            .field("frontend_origin", &self.frontend_origin)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("llm_api_url", &self.llm_api_url)
            .field("llm_model", &self.llm_model)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid LLM max tokens configuration: {0}")]
    InvalidLlmMaxTokens(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        // JWKS endpoint is required: without it every verification would fail
        // with a configuration error, so fail fast at startup instead.
        let jwks_url = vars
            .get("JWKS_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("JWKS_URL".to_string()))?
            .clone();

        let expected_audience = vars.get("EXPECTED_AUDIENCE").filter(|v| !v.is_empty()).cloned();
        let expected_issuer = vars.get("EXPECTED_ISSUER").filter(|v| !v.is_empty()).cloned();

        let dev_bypass_enabled = vars
            .get("DEV_BYPASS_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let frontend_origin = vars
            .get("FRONTEND_ORIGIN")
            .cloned()
            .unwrap_or_else(|| "*".to_string());

        let llm_api_key = vars.get("LLM_API_KEY").filter(|v| !v.is_empty()).cloned();

        let llm_api_url = vars
            .get("LLM_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string());

        let llm_model = vars
            .get("LLM_MODEL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());

        let llm_max_tokens = if let Some(value_str) = vars.get("LLM_MAX_TOKENS") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidLlmMaxTokens(format!(
                    "LLM_MAX_TOKENS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidLlmMaxTokens(
                    "LLM_MAX_TOKENS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_LLM_MAX_TOKENS
        };

        Ok(Config {
            database_url,
            bind_address,
            jwks_url,
            expected_audience,
            expected_issuer,
            dev_bypass_enabled,
            frontend_origin,
            llm_api_key,
            llm_api_url,
            llm_model,
            llm_max_tokens,
        })
    }
}
