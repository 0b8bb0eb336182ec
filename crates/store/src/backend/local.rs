//! JSON-file backend.
//!
//! Each collection is a single file holding a JSON array. Every write reads
//! the whole file, applies the change and writes the whole file back through
//! a temporary sibling that is renamed into place, so readers never observe a
//! half-written file. Writers to the same collection are serialized by a
//! per-collection mutex.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, MutexGuard};

use crate::document::{ChangeKind, Collection, Document};
use crate::error::RepositoryError;

#[derive(Debug, Default)]
struct CollectionLocks {
    products: Mutex<()>,
    orders: Mutex<()>,
    customers: Mutex<()>,
    feedback: Mutex<()>,
    chat_messages: Mutex<()>,
}

impl CollectionLocks {
    const fn get(&self, collection: Collection) -> &Mutex<()> {
        match collection {
            Collection::Products => &self.products,
            Collection::Orders => &self.orders,
            Collection::Customers => &self.customers,
            Collection::Feedback => &self.feedback,
            Collection::ChatMessages => &self.chat_messages,
        }
    }
}

/// Local JSON-file backend.
#[derive(Debug)]
pub struct LocalBackend {
    dir: PathBuf,
    locks: CollectionLocks,
}

impl LocalBackend {
    /// Open (and create if needed) the data directory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            locks: CollectionLocks::default(),
        })
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    async fn lock(&self, collection: Collection) -> MutexGuard<'_, ()> {
        self.locks.get(collection).lock().await
    }

    async fn read<D: Document>(&self) -> Result<Vec<D>, RepositoryError> {
        let path = self.path(D::COLLECTION);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            RepositoryError::DataCorruption(format!("{}: {e}", path.display()))
        })
    }

    async fn write<D: Document>(&self, docs: &[D]) -> Result<(), RepositoryError> {
        let path = self.path(D::COLLECTION);
        let tmp = self.dir.join(format!(
            ".{}.{}.tmp",
            D::COLLECTION.file_name(),
            uuid::Uuid::new_v4().simple()
        ));
        let bytes = serde_json::to_vec_pretty(docs)?;

        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::trace!(collection = %D::COLLECTION, count = docs.len(), "collection written");
        Ok(())
    }

    pub async fn all<D: Document>(&self) -> Result<Vec<D>, RepositoryError> {
        self.read().await
    }

    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<D>, RepositoryError> {
        Ok(self.read::<D>().await?.into_iter().find(|d| d.id() == id))
    }

    pub async fn insert<D: Document>(&self, doc: D) -> Result<(), RepositoryError> {
        let _guard = self.lock(D::COLLECTION).await;
        let mut docs = self.read::<D>().await?;
        if docs.iter().any(|d| d.id() == doc.id()) {
            return Err(RepositoryError::Conflict(format!(
                "{} {} already exists",
                D::COLLECTION,
                doc.id()
            )));
        }
        docs.push(doc);
        self.write(&docs).await
    }

    pub async fn put<D: Document>(&self, doc: D) -> Result<ChangeKind, RepositoryError> {
        let _guard = self.lock(D::COLLECTION).await;
        let mut docs = self.read::<D>().await?;
        let kind = if let Some(existing) = docs.iter_mut().find(|d| d.id() == doc.id()) {
            *existing = doc;
            ChangeKind::Updated
        } else {
            docs.push(doc);
            ChangeKind::Created
        };
        self.write(&docs).await?;
        Ok(kind)
    }

    pub async fn update<D, F>(&self, id: &str, f: F) -> Result<D, RepositoryError>
    where
        D: Document,
        F: FnOnce(&mut D) -> Result<(), RepositoryError> + Send,
    {
        let _guard = self.lock(D::COLLECTION).await;
        let mut docs = self.read::<D>().await?;
        let doc = docs
            .iter_mut()
            .find(|d| d.id() == id)
            .ok_or(RepositoryError::NotFound)?;
        f(doc)?;
        if doc.id() != id {
            return Err(RepositoryError::Validation("document id cannot change".into()));
        }
        let updated = doc.clone();
        self.write(&docs).await?;
        Ok(updated)
    }

    pub async fn delete<D: Document>(&self, id: &str) -> Result<bool, RepositoryError> {
        let _guard = self.lock(D::COLLECTION).await;
        let mut docs = self.read::<D>().await?;
        let before = docs.len();
        docs.retain(|d| d.id() != id);
        if docs.len() == before {
            return Ok(false);
        }
        self.write(&docs).await?;
        Ok(true)
    }

    pub async fn replace_all<D: Document>(&self, docs: Vec<D>) -> Result<(), RepositoryError> {
        let _guard = self.lock(D::COLLECTION).await;
        self.write(&docs).await
    }

    pub async fn ping(&self) -> Result<(), RepositoryError> {
        let meta = tokio::fs::metadata(&self.dir).await?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(RepositoryError::Io(std::io::Error::new(
                ErrorKind::NotADirectory,
                format!("{} is not a directory", self.dir.display()),
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use bloom_core::catalog::Product;
    use bloom_core::types::{Money, ProductId};
    use chrono::Utc;

    use super::*;

    fn product(id: &str, stock: u32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            name: id.to_string(),
            slug: id.to_string(),
            description: String::new(),
            category: "bouquets".into(),
            price: Money::from_cents(2500),
            sale_price: None,
            images: Vec::new(),
            tags: Vec::new(),
            stock,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path()).await.unwrap();
        assert!(backend.all::<Product>().await.unwrap().is_empty());
        assert!(backend.get::<Product>("rose").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_conflict_and_put() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path()).await.unwrap();

        backend.insert(product("rose", 3)).await.unwrap();
        assert!(matches!(
            backend.insert(product("rose", 9)).await,
            Err(RepositoryError::Conflict(_))
        ));

        assert_eq!(backend.put(product("rose", 9)).await.unwrap(), ChangeKind::Updated);
        assert_eq!(backend.put(product("lily", 1)).await.unwrap(), ChangeKind::Created);

        let all = backend.all::<Product>().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].stock, 9);
        assert!(dir.path().join("products.json").exists());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path()).await.unwrap();
        backend.insert(product("rose", 3)).await.unwrap();

        let updated = backend
            .update::<Product, _>("rose", |p| {
                p.stock += 2;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(updated.stock, 5);

        assert!(matches!(
            backend.update::<Product, _>("tulip", |_| Ok(())).await,
            Err(RepositoryError::NotFound)
        ));

        // A failing closure leaves the file untouched.
        let failed = backend
            .update::<Product, _>("rose", |p| {
                p.stock = 0;
                Err(RepositoryError::Validation("nope".into()))
            })
            .await;
        assert!(failed.is_err());
        assert_eq!(backend.get::<Product>("rose").await.unwrap().unwrap().stock, 5);

        assert!(backend.delete::<Product>("rose").await.unwrap());
        assert!(!backend.delete::<Product>("rose").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("products.json"), b"{not json").unwrap();
        let backend = LocalBackend::open(dir.path()).await.unwrap();
        assert!(matches!(
            backend.all::<Product>().await,
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(LocalBackend::open(dir.path()).await.unwrap());
        backend.insert(product("rose", 0)).await.unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let backend = Arc::clone(&backend);
                tokio::spawn(async move {
                    backend
                        .update::<Product, _>("rose", |p| {
                            p.stock += 1;
                            Ok(())
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let rose = backend.get::<Product>("rose").await.unwrap().unwrap();
        assert_eq!(rose.stock, 20);
    }
}
