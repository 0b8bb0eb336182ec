//! Bloom document store.
//!
//! Documents are JSON values grouped into collections. Two backends exist:
//!
//! - **`PostgreSQL`**: one `store.document` table with a JSONB body, used when
//!   a database URL is configured.
//! - **Local files**: one JSON array per collection in a data directory, used
//!   for development and small deployments without a database.
//!
//! Every successful write is announced on a broadcast change feed, which the
//! back-office streams to connected browsers.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p bloom-cli -- migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod repositories;
mod store;

pub use backend::BackendKind;
pub use config::StoreConfig;
pub use document::{ChangeEvent, ChangeKind, Collection, Document};
pub use error::RepositoryError;
pub use repositories::{
    ChatRepository, CustomerRepository, FeedbackRepository, OrderRepository, ProductRepository,
};
pub use store::{CHANGE_FEED_CAPACITY, Store, create_pool, migrate};
