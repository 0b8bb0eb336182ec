//! Subcommand implementations.

pub mod admin;
pub mod customers;
pub mod migrate;
pub mod seed;
pub mod sync;

use bloom_admin::services::AdminAuthError;
use bloom_store::{RepositoryError, Store, StoreConfig, create_pool};
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the subcommands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command needs `PostgreSQL` but only a local directory is configured.
    #[error("No database configured: set BLOOM_DATABASE_URL or DATABASE_URL")]
    MissingDatabase,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Auth(#[from] AdminAuthError),
}

/// Backend selection for CLI commands (`BLOOM_DATABASE_URL`, then
/// `DATABASE_URL`, then `BLOOM_DATA_DIR`).
pub fn store_config() -> StoreConfig {
    StoreConfig::from_env("BLOOM")
}

/// Connect to the configured database.
///
/// # Errors
///
/// Returns `CommandError::MissingDatabase` in local mode.
pub async fn connect() -> Result<PgPool, CommandError> {
    match store_config() {
        StoreConfig::Postgres { database_url } => {
            tracing::info!("Connecting to database...");
            Ok(create_pool(&database_url).await?)
        }
        StoreConfig::Local { .. } => Err(CommandError::MissingDatabase),
    }
}

/// Open whichever backend is configured.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened.
pub async fn open_store() -> Result<Store, CommandError> {
    Ok(Store::open(&store_config()).await?)
}
