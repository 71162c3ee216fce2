//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORCHARD_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ORCHARD_TOKEN_SECRET` - Bearer-token signing secret (min 32 chars, high entropy)
//! - `ORCHARD_CATALOG_URL` - Base URL of the product catalog service
//!
//! ## Optional
//! - `ORCHARD_HOST` - Bind address (default: 127.0.0.1)
//! - `ORCHARD_PORT` - Listen port (default: 3000)
//! - `ORCHARD_TOKEN_TTL_HOURS` - Bearer-token lifetime (default: 24)
//! - `ORCHARD_HASH_MEMORY_KIB` - Argon2 memory cost (default: 19456)
//! - `ORCHARD_HASH_ITERATIONS` - Argon2 time cost / work factor (default: 2)
//! - `ORCHARD_CATALOG_CACHE_CAPACITY` - Catalog cache entries (default: 1024)
//! - `ORCHARD_CATALOG_CACHE_TTL_SECS` - Catalog cache entry lifetime (default: 30)
//! - `ORCHARD_CALL_TIMEOUT_MS` - Bound on external calls: store, catalog, hashing (default: 5000)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
///
/// A missing or weak token secret is fatal here, at startup - token
/// verification itself never fails for configuration reasons per-request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Orchard server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer-token signing secret
    pub token_secret: SecretString,
    /// Bearer-token lifetime in hours
    pub token_ttl_hours: i64,
    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,
    /// Argon2 time cost (the tunable work factor)
    pub hash_iterations: u32,
    /// Base URL of the product catalog service
    pub catalog_url: Url,
    /// Maximum number of cached catalog entries
    pub catalog_cache_capacity: u64,
    /// Catalog cache entry lifetime in seconds
    pub catalog_cache_ttl_secs: u64,
    /// Upper bound on any single external call, in milliseconds
    pub external_call_timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token secret fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ORCHARD_DATABASE_URL")?;
        let host = parse_env_or_default("ORCHARD_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("ORCHARD_PORT", "3000")?;

        let token_secret = get_validated_secret("ORCHARD_TOKEN_SECRET")?;
        validate_secret_length(&token_secret, "ORCHARD_TOKEN_SECRET")?;
        let token_ttl_hours = parse_env_or_default("ORCHARD_TOKEN_TTL_HOURS", "24")?;

        let hash_memory_kib = parse_env_or_default("ORCHARD_HASH_MEMORY_KIB", "19456")?;
        let hash_iterations = parse_env_or_default("ORCHARD_HASH_ITERATIONS", "2")?;

        let catalog_url = get_required_env("ORCHARD_CATALOG_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ORCHARD_CATALOG_URL".to_owned(), e.to_string())
            })?;
        let catalog_cache_capacity = parse_env_or_default("ORCHARD_CATALOG_CACHE_CAPACITY", "1024")?;
        let catalog_cache_ttl_secs = parse_env_or_default("ORCHARD_CATALOG_CACHE_TTL_SECS", "30")?;

        let external_call_timeout_ms = parse_env_or_default("ORCHARD_CALL_TIMEOUT_MS", "5000")?;

        Ok(Self {
            database_url,
            host,
            port,
            token_secret,
            token_ttl_hours,
            hash_memory_kib,
            hash_iterations,
            catalog_url,
            catalog_cache_capacity,
            catalog_cache_ttl_secs,
            external_call_timeout_ms,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an environment variable with a default value, parsed into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_owned())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Validate that the token secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
