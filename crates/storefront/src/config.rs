//! Cart engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `EAZIKA_API_URL` - Storefront backend base URL (default: `https://api.eazika.com`)
//! - `EAZIKA_API_TOKEN` - Bearer token for the signed-in customer
//! - `EAZIKA_CATALOG_PATH` - Path to a YAML/JSON product catalog snapshot
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Backend used when `EAZIKA_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "https://api.eazika.com";

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Top-level configuration for a cart session.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub api: CartApiConfig,
    /// Catalog snapshot used for the display join
    pub catalog_path: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Storefront backend API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct CartApiConfig {
    /// Base URL of the backend (paths are appended to it)
    pub base_url: Url,
    /// Bearer token for the signed-in customer
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for CartApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Lookup(&lookup);

        let raw_url = env.or_default("EAZIKA_API_URL", DEFAULT_API_URL);
        let base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("EAZIKA_API_URL".to_string(), e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "EAZIKA_API_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let access_token = env.optional_secret("EAZIKA_API_TOKEN")?;

        Ok(Self {
            api: CartApiConfig {
                base_url,
                access_token,
            },
            catalog_path: env.optional("EAZIKA_CATALOG_PATH").map(PathBuf::from),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Lookup<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get an optional secret, rejecting obvious placeholders.
    fn optional_secret(&self, key: &str) -> Result<Option<SecretString>, ConfigError> {
        self.optional(key)
            .map(|value| {
                validate_secret_strength(&value, key)?;
                Ok(SecretString::from(value))
            })
            .transpose()
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"),
        ));
    }

    Ok(())
}

/// Expose a configured token for diagnostics (first four characters only).
#[must_use]
pub fn token_hint(token: &SecretString) -> String {
    let prefix: String = token.expose_secret().chars().take(4).collect();
    format!("{prefix}…")
}
