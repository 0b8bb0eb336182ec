//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Argon2 password verification for the back-office account

pub mod auth;

pub use auth::{AdminAuthError, hash_password, verify_credentials};
