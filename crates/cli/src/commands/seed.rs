//! Seed the product catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Red Rose Bouquet
//!     category: bouquets
//!     price: "45.00"
//!     stock: 12
//! ```
//!
//! Without `--replace`, products whose slug already exists are skipped, so
//! the command can be re-run. With `--replace` the collection is swapped in
//! one write.

use std::collections::HashSet;
use std::path::Path;

use bloom_core::catalog::{NewProduct, Product};
use bloom_store::{ProductRepository, Store};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{CommandError, open_store};

/// Catalog file layout.
#[derive(Debug, Deserialize)]
pub struct Catalog {
    pub products: Vec<NewProduct>,
}

/// Outcome of a seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse a catalog.
///
/// # Errors
///
/// Returns `CommandError::Yaml` for malformed input.
pub fn parse_catalog(yaml: &str) -> Result<Catalog, CommandError> {
    Ok(serde_yaml::from_str(yaml)?)
}

fn build(input: NewProduct, now: DateTime<Utc>) -> Result<Product, CommandError> {
    let name = input.name.clone();
    input
        .into_product(now)
        .map_err(|e| CommandError::Validation(format!("{name}: {e}")))
}

/// Load a parsed catalog into a store.
///
/// # Errors
///
/// Returns `CommandError::Validation` for invalid or duplicate products and
/// store errors otherwise.
pub async fn load(
    store: &Store,
    catalog: Catalog,
    replace: bool,
    now: DateTime<Utc>,
) -> Result<SeedSummary, CommandError> {
    if replace {
        let mut seen = HashSet::new();
        let mut products = Vec::with_capacity(catalog.products.len());
        for input in catalog.products {
            let product = build(input, now)?;
            if !seen.insert(product.slug.clone()) {
                return Err(CommandError::Validation(format!(
                    "duplicate slug '{}'",
                    product.slug
                )));
            }
            products.push(product);
        }
        let inserted = products.len();
        store.replace_all(products).await?;
        return Ok(SeedSummary {
            inserted,
            skipped: 0,
        });
    }

    let mut slugs: HashSet<String> = ProductRepository::new(store)
        .all()
        .await?
        .into_iter()
        .map(|p| p.slug)
        .collect();

    let mut summary = SeedSummary::default();
    for input in catalog.products {
        let product = build(input, now)?;
        if !slugs.insert(product.slug.clone()) {
            tracing::debug!(slug = %product.slug, "Product exists, skipping");
            summary.skipped += 1;
            continue;
        }
        store.insert(product).await?;
        summary.inserted += 1;
    }
    Ok(summary)
}

/// Seed products from `path` into the configured store.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the store
/// write fails.
pub async fn catalog(path: &Path, replace: bool) -> Result<(), CommandError> {
    tracing::info!(path = %path.display(), "Loading catalog");
    let content = tokio::fs::read_to_string(path).await?;
    let catalog = parse_catalog(&content)?;
    tracing::info!(products = catalog.products.len(), "Parsed catalog");

    let store = open_store().await?;
    let summary = load(&store, catalog, replace, Utc::now()).await?;

    tracing::info!("Seeding complete!");
    tracing::info!("  Products inserted: {}", summary.inserted);
    tracing::info!("  Products skipped (already exist): {}", summary.skipped);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
products:
  - name: Red Rose Bouquet
    category: bouquets
    price: "45.00"
    stock: 12
  - name: Sunflower Basket
    category: baskets
    price: "30.00"
"#;

    #[tokio::test]
    async fn test_seed_is_rerunnable() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();

        let first = load(&store, parse_catalog(CATALOG).unwrap(), false, Utc::now())
            .await
            .unwrap();
        assert_eq!(first, SeedSummary { inserted: 2, skipped: 0 });

        let second = load(&store, parse_catalog(CATALOG).unwrap(), false, Utc::now())
            .await
            .unwrap();
        assert_eq!(second, SeedSummary { inserted: 0, skipped: 2 });
        assert_eq!(ProductRepository::new(&store).all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_swaps_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();
        load(&store, parse_catalog(CATALOG).unwrap(), false, Utc::now())
            .await
            .unwrap();

        let one = r#"
products:
  - name: White Lily
    category: bouquets
    price: "25.00"
"#;
        let summary = load(&store, parse_catalog(one).unwrap(), true, Utc::now())
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        let products = ProductRepository::new(&store).all().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].slug, "white-lily");
    }

    #[tokio::test]
    async fn test_replace_rejects_duplicate_slugs() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::local(dir.path()).await.unwrap();
        let dupes = r#"
products:
  - name: Tulips
    category: bouquets
    price: "20.00"
  - name: tulips
    category: bouquets
    price: "22.00"
"#;
        let err = load(&store, parse_catalog(dupes).unwrap(), true, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            parse_catalog("products: [name: x"),
            Err(CommandError::Yaml(_))
        ));
    }
}
