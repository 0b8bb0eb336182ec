//! Copy collections between the local JSON backend and `PostgreSQL`.
//!
//! Each collection on the target is replaced wholesale by the source's
//! contents, so running an import twice leaves the same data.

use std::path::Path;

use bloom_core::catalog::Product;
use bloom_core::chat::{ChatMessage, Feedback};
use bloom_core::customer::Customer;
use bloom_core::order::Order;
use bloom_store::{Document, Store};

use super::{CommandError, connect};

async fn copy<D: Document>(from: &Store, to: &Store) -> Result<usize, CommandError> {
    let docs: Vec<D> = from.all().await?;
    let count = docs.len();
    to.replace_all(docs).await?;
    tracing::info!(collection = D::COLLECTION.as_str(), documents = count, "Collection copied");
    Ok(count)
}

/// Copy every collection; returns the number of documents written.
///
/// # Errors
///
/// Returns the first store error; collections already copied stay copied.
pub async fn copy_all(from: &Store, to: &Store) -> Result<usize, CommandError> {
    Ok(copy::<Product>(from, to).await?
        + copy::<Order>(from, to).await?
        + copy::<Customer>(from, to).await?
        + copy::<Feedback>(from, to).await?
        + copy::<ChatMessage>(from, to).await?)
}

/// Load a local data directory into the database.
///
/// # Errors
///
/// Returns an error if the directory does not exist, no database is
/// configured, or a copy fails.
pub async fn import(dir: &Path) -> Result<(), CommandError> {
    if !tokio::fs::metadata(dir).await?.is_dir() {
        return Err(CommandError::Validation(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let source = Store::local(dir).await?;
    let target = Store::postgres(connect().await?);
    let total = copy_all(&source, &target).await?;
    tracing::info!(documents = total, "Import complete!");
    Ok(())
}

/// Write the database contents to a local data directory.
///
/// # Errors
///
/// Returns an error if no database is configured or a copy fails.
pub async fn export(dir: &Path) -> Result<(), CommandError> {
    let source = Store::postgres(connect().await?);
    let target = Store::local(dir).await?;
    let total = copy_all(&source, &target).await?;
    tracing::info!(documents = total, dir = %dir.display(), "Export complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bloom_core::catalog::NewProduct;
    use bloom_core::chat::NewFeedback;
    use bloom_store::{FeedbackRepository, ProductRepository};
    use chrono::Utc;

    use super::*;

    #[tokio::test]
    async fn test_copy_all_replaces_target() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        let source = Store::local(src_dir.path()).await.unwrap();
        let target = Store::local(dst_dir.path()).await.unwrap();

        let product: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "Peony Posy", "category": "bouquets", "price": "38.00"
        }))
        .unwrap();
        ProductRepository::new(&source)
            .create(product, Utc::now())
            .await
            .unwrap();
        let feedback: NewFeedback = serde_json::from_value(serde_json::json!({
            "name": "Mai", "message": "Lovely flowers"
        }))
        .unwrap();
        FeedbackRepository::new(&source)
            .create(feedback, Utc::now())
            .await
            .unwrap();

        let stale: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "Old Stock", "category": "bouquets", "price": "10.00"
        }))
        .unwrap();
        ProductRepository::new(&target)
            .create(stale, Utc::now())
            .await
            .unwrap();

        assert_eq!(copy_all(&source, &target).await.unwrap(), 2);

        let products = ProductRepository::new(&target).all().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products.first().unwrap().slug, "peony-posy");
        assert_eq!(FeedbackRepository::new(&target).list(None).await.unwrap().len(), 1);
    }
}
