//! Bloom CLI - Migrations, seeding and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the document table and both session tables
//! bloom-cli migrate
//!
//! # Load the product catalog (skips products whose slug exists)
//! bloom-cli seed crates/cli/seed/catalog.yaml
//! bloom-cli seed crates/cli/seed/catalog.yaml --replace
//!
//! # Move data between local JSON files and PostgreSQL
//! bloom-cli sync import ./data
//! bloom-cli sync export ./backup
//!
//! # Rebuild customer order totals
//! bloom-cli customers recompute
//!
//! # Produce ADMIN_PASSWORD_HASH
//! bloom-cli admin hash-password 'correct horse battery staple'
//! ```
//!
//! # Environment Variables
//!
//! - `BLOOM_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string
//! - `BLOOM_DATA_DIR` - Local data directory when no database is configured

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bloom-cli")]
#[command(author, version, about = "Bloom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (documents and session tables)
    Migrate,
    /// Load products from a YAML catalog
    Seed {
        /// Path to the catalog file
        file: PathBuf,

        /// Replace the whole product collection instead of adding to it
        #[arg(long)]
        replace: bool,
    },
    /// Copy collections between local JSON files and `PostgreSQL`
    Sync {
        #[command(subcommand)]
        direction: SyncDirection,
    },
    /// Customer maintenance
    Customers {
        #[command(subcommand)]
        action: CustomersAction,
    },
    /// Back-office account helpers
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SyncDirection {
    /// Local JSON directory → `PostgreSQL`
    Import { dir: PathBuf },
    /// `PostgreSQL` → local JSON directory
    Export { dir: PathBuf },
}

#[derive(Subcommand)]
enum CustomersAction {
    /// Recompute order counts and totals for every customer
    Recompute,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Print an Argon2 hash for `ADMIN_PASSWORD_HASH`
    HashPassword { password: String },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, replace } => {
            commands::seed::catalog(&file, replace).await?;
        }
        Commands::Sync { direction } => match direction {
            SyncDirection::Import { dir } => commands::sync::import(&dir).await?,
            SyncDirection::Export { dir } => commands::sync::export(&dir).await?,
        },
        Commands::Customers { action } => match action {
            CustomersAction::Recompute => commands::customers::recompute().await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::HashPassword { password } => commands::admin::hash_password(&password)?,
        },
    }
    Ok(())
}
