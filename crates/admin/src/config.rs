//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_EMAIL` - Login email of the back-office account
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC hash of its password
//!   (generate with `bloom-cli admin hash-password`)
//!
//! ## Storage
//! - `ADMIN_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string.
//!   When neither is set the admin runs on local JSON files.
//! - `BLOOM_DATA_DIR` - Local data directory (default: `data`)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_BASE_URL` - Public URL (default: <http://localhost:3001>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 1.0)
//! - `BLOOM_LOG_JSON` - Emit JSON logs when set

use std::net::{IpAddr, SocketAddr};

use argon2::PasswordHash;
use bloom_core::types::Email;
use bloom_store::StoreConfig;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// The single back-office account.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl AdminCredentials {
    /// Build credentials, checking that the hash is an Argon2 PHC string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureSecret` for anything that is not an
    /// Argon2 hash (e.g. a plaintext password).
    pub fn new(email: Email, password_hash: SecretString) -> Result<Self, ConfigError> {
        validate_password_hash(&password_hash, "ADMIN_PASSWORD_HASH")?;
        Ok(Self {
            email,
            password_hash,
        })
    }
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin API
    pub base_url: String,
    /// Document store backend
    pub store: StoreConfig,
    /// Back-office login
    pub credentials: AdminCredentials,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs
    pub log_json: bool,
}

impl AdminConfig {
    /// Configuration with defaults over the given store and credentials.
    #[must_use]
    pub fn new(store: StoreConfig, credentials: AdminCredentials) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            store,
            credentials,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            log_json: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string())
            })?;

        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string())
            })?;

        let email = Email::parse(&get_required_env("ADMIN_EMAIL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string()))?;
        let credentials = AdminCredentials::new(
            email,
            SecretString::from(get_required_env("ADMIN_PASSWORD_HASH")?),
        )?;

        Ok(Self {
            host,
            port,
            base_url: get_env_or_default("ADMIN_BASE_URL", "http://localhost:3001"),
            store: StoreConfig::from_env("ADMIN"),
            credentials,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            log_json: get_optional_env("BLOOM_LOG_JSON").is_some(),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked secure.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reject anything that is not an Argon2 PHC string.
fn validate_password_hash(hash: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let parsed = PasswordHash::new(hash.expose_secret().trim()).map_err(|_| {
        ConfigError::InsecureSecret(
            var_name.to_string(),
            "not a PHC hash string; store a hash, never the password".to_string(),
        )
    })?;
    if !parsed.algorithm.as_str().starts_with("argon2") {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("unsupported algorithm '{}'", parsed.algorithm),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::auth::hash_password;

    #[test]
    fn test_plaintext_password_rejected() {
        let err = validate_password_hash(&SecretString::from("hunter2"), "X").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_argon2_hash_accepted() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(validate_password_hash(&SecretString::from(hash), "X").is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_hash() {
        let hash = hash_password("pw-for-debug").unwrap();
        let creds = AdminCredentials::new(
            Email::parse("owner@bloom.test").unwrap(),
            SecretString::from(hash.clone()),
        )
        .unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&hash));
    }

    #[test]
    fn test_socket_addr() {
        let hash = hash_password("pw").unwrap();
        let creds = AdminCredentials::new(
            Email::parse("owner@bloom.test").unwrap(),
            SecretString::from(hash),
        )
        .unwrap();
        let config = AdminConfig::new(StoreConfig::local("data"), creds);
        assert_eq!(config.socket_addr().port(), 3001);
        assert!(!config.is_secure());
    }
}
