//! Product catalog operations.

use chrono::{DateTime, Utc};

use bloom_core::catalog::{
    CategoryCount, NewProduct, Product, ProductFilter, ProductUpdate, category_counts,
    filter_products,
};
use bloom_core::order::OrderItem;
use bloom_core::types::ProductId;

use crate::error::RepositoryError;
use crate::store::Store;

/// Repository for products.
pub struct ProductRepository<'a> {
    store: &'a Store,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Every product, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        self.store.all().await
    }

    /// Filtered and sorted listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        Ok(filter_products(self.all().await?, filter))
    }

    /// Categories with product counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        Ok(category_counts(&self.all().await?))
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.store.get(id.as_str()).await
    }

    /// Get a product by id, falling back to its slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn find(&self, id_or_slug: &str) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.store.get::<Product>(id_or_slug).await? {
            return Ok(Some(product));
        }
        Ok(self
            .all()
            .await?
            .into_iter()
            .find(|p| p.slug == id_or_slug))
    }

    /// Create a product. A taken slug gets a numeric suffix.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for invalid input.
    pub async fn create(
        &self,
        input: NewProduct,
        now: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        let mut product = input
            .into_product(now)
            .map_err(RepositoryError::validation)?;

        let existing = self.all().await?;
        let base = product.slug.clone();
        let mut n = 2;
        while existing.iter().any(|p| p.slug == product.slug) {
            product.slug = format!("{base}-{n}");
            n += 1;
        }

        let product = self.store.insert(product).await?;
        tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Validation`.
    pub async fn update(
        &self,
        id: &ProductId,
        update: ProductUpdate,
        now: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        self.store
            .update(id.as_str(), move |p: &mut Product| {
                update.apply(p, now).map_err(RepositoryError::validation)
            })
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        if self.store.delete::<Product>(id.as_str()).await? {
            tracing::info!(product_id = %id, "Product deleted");
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    /// Add `delta` (possibly negative) to the stock, saturating at zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn adjust_stock(
        &self,
        id: &ProductId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        self.store
            .update(id.as_str(), move |p: &mut Product| {
                let next = i64::from(p.stock).saturating_add(delta).max(0);
                p.stock = u32::try_from(next).unwrap_or(u32::MAX);
                p.updated_at = now;
                Ok(())
            })
            .await
    }

    /// Take ordered quantities out of stock.
    ///
    /// Products deleted since the order was priced are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first store error other than a missing product.
    pub async fn decrement_stock(
        &self,
        items: &[OrderItem],
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        for item in items {
            match self
                .adjust_stock(&item.product_id, -i64::from(item.quantity), now)
                .await
            {
                Ok(product) => {
                    tracing::debug!(product_id = %item.product_id, stock = product.stock, "Stock decremented");
                }
                Err(RepositoryError::NotFound) => {
                    tracing::warn!(product_id = %item.product_id, "Ordered product no longer exists");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bloom_core::types::Money;

    use super::*;

    fn new_product(name: &str, stock: u32) -> NewProduct {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "category": "bouquets",
            "price": "25.00",
            "stock": stock,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_dedupes_slugs_and_finds_by_slug() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();
        let repo = ProductRepository::new(&store);

        let a = repo.create(new_product("Red Roses", 5), Utc::now()).await.unwrap();
        let b = repo.create(new_product("Red Roses", 5), Utc::now()).await.unwrap();
        assert_eq!(a.slug, "red-roses");
        assert_eq!(b.slug, "red-roses-2");

        let found = repo.find("red-roses-2").await.unwrap().unwrap();
        assert_eq!(found.id, b.id);
        assert_eq!(repo.find(a.id.as_str()).await.unwrap().unwrap().id, a.id);
        assert_eq!(found.price, Money::from_cents(2500));
    }

    #[tokio::test]
    async fn test_adjust_stock_saturates() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();
        let repo = ProductRepository::new(&store);
        let p = repo.create(new_product("Tulips", 3), Utc::now()).await.unwrap();

        assert_eq!(repo.adjust_stock(&p.id, 4, Utc::now()).await.unwrap().stock, 7);
        assert_eq!(repo.adjust_stock(&p.id, -10, Utc::now()).await.unwrap().stock, 0);
        assert!(matches!(
            repo.adjust_stock(&ProductId::new("ghost"), 1, Utc::now()).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_invalid_product_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();
        let repo = ProductRepository::new(&store);
        assert!(matches!(
            repo.create(new_product("  ", 1), Utc::now()).await,
            Err(RepositoryError::Validation(_))
        ));
    }
}
