//! The document store handle shared by every service.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::broadcast;

use crate::backend::{Backend, BackendKind, LocalBackend, PostgresBackend};
use crate::config::StoreConfig;
use crate::document::{ChangeEvent, ChangeKind, Collection, Document};
use crate::error::RepositoryError;

/// Buffered change events per subscriber before it starts lagging.
pub const CHANGE_FEED_CAPACITY: usize = 256;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the document-store migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Cheaply cloneable handle to the document store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    backend: Backend,
    changes: broadcast::Sender<ChangeEvent>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.inner.backend.kind())
            .field("subscribers", &self.inner.changes.receiver_count())
            .finish()
    }
}

impl Store {
    fn from_backend(backend: Backend) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(StoreInner { backend, changes }),
        }
    }

    /// Open the backend selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or the data
    /// directory cannot be created.
    pub async fn open(config: &StoreConfig) -> Result<Self, RepositoryError> {
        match config {
            StoreConfig::Postgres { database_url } => {
                let pool = create_pool(database_url).await?;
                tracing::info!("Document store: PostgreSQL");
                Ok(Self::postgres(pool))
            }
            StoreConfig::Local { data_dir } => {
                let store = Self::local(data_dir.clone()).await?;
                tracing::info!(dir = %data_dir.display(), "Document store: local JSON files");
                Ok(store)
            }
        }
    }

    /// Store over an existing pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Backend::Postgres(PostgresBackend::new(pool)))
    }

    /// Store over JSON files in `dir`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the directory cannot be created.
    pub async fn local(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        Ok(Self::from_backend(Backend::Local(
            LocalBackend::open(dir).await?,
        )))
    }

    /// Which backend is active.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.inner.backend.kind()
    }

    /// The connection pool, in database mode.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        match &self.inner.backend {
            Backend::Postgres(pg) => Some(pg.pool()),
            Backend::Local(_) => None,
        }
    }

    /// Subscribe to change events from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.changes.subscribe()
    }

    fn notify(&self, collection: Collection, id: &str, kind: ChangeKind) {
        let event = ChangeEvent {
            collection,
            id: id.to_owned(),
            kind,
            at: Utc::now(),
        };
        // No subscribers is not an error.
        let _ = self.inner.changes.send(event);
    }

    /// Every document in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or stored data is corrupt.
    pub async fn all<D: Document>(&self) -> Result<Vec<D>, RepositoryError> {
        self.inner.backend.all().await
    }

    /// One document by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or stored data is corrupt.
    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<D>, RepositoryError> {
        self.inner.backend.get(id).await
    }

    /// Insert a new document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is taken.
    pub async fn insert<D: Document>(&self, doc: D) -> Result<D, RepositoryError> {
        self.inner.backend.insert(doc.clone()).await?;
        self.notify(D::COLLECTION, doc.id(), ChangeKind::Created);
        Ok(doc)
    }

    /// Insert or replace a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn put<D: Document>(&self, doc: D) -> Result<ChangeKind, RepositoryError> {
        let id = doc.id().to_owned();
        let kind = self.inner.backend.put(doc).await?;
        self.notify(D::COLLECTION, &id, kind);
        Ok(kind)
    }

    /// Read-modify-write one document. Nothing is written if `f` fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for a missing id, or whatever `f`
    /// returns.
    pub async fn update<D, F>(&self, id: &str, f: F) -> Result<D, RepositoryError>
    where
        D: Document,
        F: FnOnce(&mut D) -> Result<(), RepositoryError> + Send,
    {
        let doc = self.inner.backend.update(id, f).await?;
        self.notify(D::COLLECTION, id, ChangeKind::Updated);
        Ok(doc)
    }

    /// Delete a document. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn delete<D: Document>(&self, id: &str) -> Result<bool, RepositoryError> {
        let deleted = self.inner.backend.delete::<D>(id).await?;
        if deleted {
            self.notify(D::COLLECTION, id, ChangeKind::Deleted);
        }
        Ok(deleted)
    }

    /// Replace a whole collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn replace_all<D: Document>(&self, docs: Vec<D>) -> Result<(), RepositoryError> {
        let count = docs.len();
        self.inner.backend.replace_all(docs).await?;
        tracing::info!(collection = %D::COLLECTION, count, "Collection replaced");
        self.notify(D::COLLECTION, "", ChangeKind::Reloaded);
        Ok(())
    }

    /// Readiness check.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        self.inner.backend.ping().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bloom_core::chat::{ChatMessage, Feedback, NewFeedback};
    use bloom_core::types::{ChatSender, ConversationId};

    use super::*;

    fn feedback() -> Feedback {
        NewFeedback {
            name: "Minh".into(),
            email: None,
            phone: None,
            rating: Some(4),
            message: "Lovely peonies".into(),
        }
        .into_feedback(Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn test_writes_are_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();
        let mut rx = store.subscribe();

        let fb = store.insert(feedback()).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.collection, Collection::Feedback);
        assert_eq!(event.id, fb.id.as_str());
        assert_eq!(event.kind, ChangeKind::Created);

        store
            .update::<Feedback, _>(fb.id.as_str(), |f| {
                f.message.push('!');
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Updated);

        assert!(store.delete::<Feedback>(fb.id.as_str()).await.unwrap());
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Deleted);

        // Deleting a missing document is silent.
        assert!(!store.delete::<Feedback>(fb.id.as_str()).await.unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_collections_are_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();

        store.insert(feedback()).await.unwrap();
        let message = ChatMessage::new(
            ConversationId::new("c1"),
            ChatSender::Customer,
            "hi",
            Utc::now(),
        )
        .unwrap();
        store.insert(message).await.unwrap();

        assert!(dir.path().join("feedback.json").exists());
        assert!(dir.path().join("chat_messages.json").exists());
        assert_eq!(store.all::<Feedback>().await.unwrap().len(), 1);
        assert_eq!(store.backend_kind(), BackendKind::Local);
        assert!(store.pool().is_none());
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();
        store.insert(feedback()).await.unwrap();
        store.replace_all(vec![feedback(), feedback()]).await.unwrap();
        assert_eq!(store.all::<Feedback>().await.unwrap().len(), 2);
        store.replace_all::<Feedback>(Vec::new()).await.unwrap();
        assert!(store.all::<Feedback>().await.unwrap().is_empty());
    }
}
