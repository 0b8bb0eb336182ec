//! Storage backends.

mod local;
mod postgres;

pub use local::LocalBackend;
pub use postgres::PostgresBackend;

use serde::Serialize;

use crate::document::{ChangeKind, Document};
use crate::error::RepositoryError;

/// Which backend a store runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Postgres,
    Local,
}

/// The active backend.
#[derive(Debug)]
pub enum Backend {
    Postgres(PostgresBackend),
    Local(LocalBackend),
}

macro_rules! dispatch {
    ($self:ident, $backend:ident => $call:expr) => {
        match $self {
            Backend::Postgres($backend) => $call,
            Backend::Local($backend) => $call,
        }
    };
}

impl Backend {
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Postgres(_) => BackendKind::Postgres,
            Self::Local(_) => BackendKind::Local,
        }
    }

    pub async fn all<D: Document>(&self) -> Result<Vec<D>, RepositoryError> {
        dispatch!(self, b => b.all().await)
    }

    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<D>, RepositoryError> {
        dispatch!(self, b => b.get(id).await)
    }

    pub async fn insert<D: Document>(&self, doc: D) -> Result<(), RepositoryError> {
        dispatch!(self, b => b.insert(doc).await)
    }

    pub async fn put<D: Document>(&self, doc: D) -> Result<ChangeKind, RepositoryError> {
        dispatch!(self, b => b.put(doc).await)
    }

    pub async fn update<D, F>(&self, id: &str, f: F) -> Result<D, RepositoryError>
    where
        D: Document,
        F: FnOnce(&mut D) -> Result<(), RepositoryError> + Send,
    {
        dispatch!(self, b => b.update(id, f).await)
    }

    pub async fn delete<D: Document>(&self, id: &str) -> Result<bool, RepositoryError> {
        dispatch!(self, b => b.delete::<D>(id).await)
    }

    pub async fn replace_all<D: Document>(&self, docs: Vec<D>) -> Result<(), RepositoryError> {
        dispatch!(self, b => b.replace_all(docs).await)
    }

    pub async fn ping(&self) -> Result<(), RepositoryError> {
        dispatch!(self, b => b.ping().await)
    }
}
