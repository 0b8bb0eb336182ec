//! Database migration command.
//!
//! Creates, in order:
//!
//! 1. `store.document` (the JSONB document table, `crates/store/migrations/`)
//! 2. the storefront session table (`tower_sessions.session`)
//! 3. the admin session table (`admin.session`)
//!
//! Safe to run repeatedly.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run every migration against the configured database.
///
/// # Errors
///
/// Returns an error if no database is configured or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running document store migrations...");
    bloom_store::migrate(&pool).await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Creating admin session table...");
    PostgresStore::new(pool)
        .with_schema_name("admin")
        .map_err(CommandError::Validation)?
        .with_table_name("session")
        .map_err(CommandError::Validation)?
        .migrate()
        .await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
