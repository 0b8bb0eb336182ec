//! Store backend selection.
//!
//! # Environment Variables
//!
//! - `<PRIMARY>_DATABASE_URL` - `PostgreSQL` URL for this service (e.g. `STOREFRONT_DATABASE_URL`)
//! - `DATABASE_URL` - Fallback `PostgreSQL` URL
//! - `BLOOM_DATA_DIR` - Directory for the local JSON backend (default: `data`)
//!
//! When no database URL is set the services run against local JSON files.

use std::path::PathBuf;

use secrecy::SecretString;

/// Default directory for the local backend.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Which backend to open.
#[derive(Clone)]
pub enum StoreConfig {
    /// `PostgreSQL` JSONB documents.
    Postgres { database_url: SecretString },
    /// One JSON file per collection under `data_dir`.
    Local { data_dir: PathBuf },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .finish(),
            Self::Local { data_dir } => f
                .debug_struct("Local")
                .field("data_dir", data_dir)
                .finish(),
        }
    }
}

impl StoreConfig {
    /// Load from the environment.
    ///
    /// `primary` is the service prefix, e.g. `"STOREFRONT"` reads
    /// `STOREFRONT_DATABASE_URL` before `DATABASE_URL`.
    #[must_use]
    pub fn from_env(primary: &str) -> Self {
        Self::resolve(
            get_optional_env(&format!("{primary}_DATABASE_URL")),
            get_optional_env("DATABASE_URL"),
            get_optional_env("BLOOM_DATA_DIR"),
        )
    }

    /// Pick a backend from already-read settings. Blank values count as unset.
    #[must_use]
    pub fn resolve(
        primary_url: Option<String>,
        fallback_url: Option<String>,
        data_dir: Option<String>,
    ) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        if let Some(url) = non_blank(primary_url).or_else(|| non_blank(fallback_url)) {
            return Self::Postgres {
                database_url: SecretString::from(url),
            };
        }
        Self::Local {
            data_dir: PathBuf::from(
                non_blank(data_dir).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
        }
    }

    /// Local backend rooted at `dir`.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self::Local {
            data_dir: dir.into(),
        }
    }

    /// Whether this selects the database backend.
    #[must_use]
    pub const fn is_database(&self) -> bool {
        matches!(self, Self::Postgres { .. })
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_url_wins() {
        let config = StoreConfig::resolve(
            Some("postgres://primary".into()),
            Some("postgres://fallback".into()),
            None,
        );
        assert!(config.is_database());
    }

    #[test]
    fn test_fallback_url_used_when_primary_blank() {
        let config = StoreConfig::resolve(Some("  ".into()), Some("postgres://fallback".into()), None);
        assert!(config.is_database());
    }

    #[test]
    fn test_local_when_no_url() {
        match StoreConfig::resolve(None, None, None) {
            StoreConfig::Local { data_dir } => assert_eq!(data_dir, PathBuf::from("data")),
            StoreConfig::Postgres { .. } => panic!("expected local backend"),
        }
        match StoreConfig::resolve(None, Some(String::new()), Some("/srv/bloom".into())) {
            StoreConfig::Local { data_dir } => assert_eq!(data_dir, PathBuf::from("/srv/bloom")),
            StoreConfig::Postgres { .. } => panic!("expected local backend"),
        }
    }

    #[test]
    fn test_debug_redacts_url() {
        let config = StoreConfig::resolve(Some("postgres://user:hunter2@db".into()), None, None);
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }
}
