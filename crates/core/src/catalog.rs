//! Product catalog: products, validation, filtering and sorting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Money, ProductId};

/// Validation errors for product input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("product name is required")]
    MissingName,
    #[error("product category is required")]
    MissingCategory,
    #[error("price must be greater than zero")]
    InvalidPrice,
    #[error("sale price must be lower than the regular price")]
    InvalidSalePrice,
}

/// A product in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a shopper pays: the sale price when it undercuts the list price.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        match self.sale_price {
            Some(sale) if sale < self.price => sale,
            _ => self.price,
        }
    }

    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: Money,
    #[serde(default)]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
}

impl NewProduct {
    /// Validate the input.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductError`] found.
    pub fn validate(&self) -> Result<(), ProductError> {
        validate_fields(&self.name, &self.category, self.price, self.sale_price)
    }

    /// Validate and build a product with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if the input is invalid.
    pub fn into_product(self, now: DateTime<Utc>) -> Result<Product, ProductError> {
        self.validate()?;
        let slug = self
            .slug
            .filter(|s| !s.trim().is_empty())
            .map_or_else(|| slugify(&self.name), |s| slugify(&s));

        Ok(Product {
            id: ProductId::generate(),
            name: self.name.trim().to_owned(),
            slug,
            description: self.description.trim().to_owned(),
            category: self.category.trim().to_owned(),
            price: self.price,
            sale_price: self.sale_price,
            images: self.images,
            tags: self.tags,
            stock: self.stock,
            featured: self.featured,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub sale_price: Option<Money>,
    /// Remove the sale price (takes precedence over `sale_price`).
    #[serde(default)]
    pub clear_sale_price: bool,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub stock: Option<u32>,
    pub featured: Option<bool>,
}

impl ProductUpdate {
    /// Apply the patch to `product`, validating the result.
    ///
    /// The product is left untouched when validation fails.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if the patched product would be invalid.
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) -> Result<(), ProductError> {
        let mut next = product.clone();
        if let Some(name) = self.name {
            next.name = name.trim().to_owned();
        }
        if let Some(slug) = self.slug {
            next.slug = slugify(&slug);
        }
        if let Some(description) = self.description {
            next.description = description.trim().to_owned();
        }
        if let Some(category) = self.category {
            next.category = category.trim().to_owned();
        }
        if let Some(price) = self.price {
            next.price = price;
        }
        if self.clear_sale_price {
            next.sale_price = None;
        } else if let Some(sale) = self.sale_price {
            next.sale_price = Some(sale);
        }
        if let Some(images) = self.images {
            next.images = images;
        }
        if let Some(tags) = self.tags {
            next.tags = tags;
        }
        if let Some(stock) = self.stock {
            next.stock = stock;
        }
        if let Some(featured) = self.featured {
            next.featured = featured;
        }

        validate_fields(&next.name, &next.category, next.price, next.sale_price)?;
        next.updated_at = now;
        *product = next;
        Ok(())
    }
}

fn validate_fields(
    name: &str,
    category: &str,
    price: Money,
    sale_price: Option<Money>,
) -> Result<(), ProductError> {
    if name.trim().is_empty() {
        return Err(ProductError::MissingName);
    }
    if category.trim().is_empty() {
        return Err(ProductError::MissingCategory);
    }
    if price.is_zero() {
        return Err(ProductError::InvalidPrice);
    }
    if sale_price.is_some_and(|sale| sale >= price) {
        return Err(ProductError::InvalidSalePrice);
    }
    Ok(())
}

/// Build a URL slug: lowercase ASCII alphanumerics separated by single dashes.
///
/// ```
/// use bloom_core::catalog::slugify;
///
/// assert_eq!(slugify("  Red Roses & Baby's Breath "), "red-roses-baby-s-breath");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Listing filter, typically parsed from query parameters.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Free-text search over name, description, category and tags.
    pub q: Option<String>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Whether a product passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty())
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
            && !product.matches_text(&q.to_lowercase())
        {
            return false;
        }
        if self.featured.is_some_and(|f| product.featured != f) {
            return false;
        }
        if self.in_stock.is_some_and(|s| product.in_stock() != s) {
            return false;
        }
        let price = product.effective_price();
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        true
    }
}

/// Filter and sort a product list.
#[must_use]
pub fn filter_products(products: Vec<Product>, filter: &ProductFilter) -> Vec<Product> {
    let mut matched: Vec<Product> = products.into_iter().filter(|p| filter.matches(p)).collect();
    sort_products(&mut matched, filter.sort);
    matched
}

/// Sort products in place.
pub fn sort_products(products: &mut [Product], sort: ProductSort) {
    match sort {
        ProductSort::Newest => products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        }),
        ProductSort::PriceAsc => products.sort_by(|a, b| {
            a.effective_price()
                .cmp(&b.effective_price())
                .then_with(|| a.name.cmp(&b.name))
        }),
        ProductSort::PriceDesc => products.sort_by(|a, b| {
            b.effective_price()
                .cmp(&a.effective_price())
                .then_with(|| a.name.cmp(&b.name))
        }),
        ProductSort::Name => {
            products.sort_by_cached_key(|p| p.name.to_lowercase());
        }
    }
}

/// Number of products in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Categories with their product counts, sorted by name.
#[must_use]
pub fn category_counts(products: &[Product]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for product in products {
        *counts.entry(product.category.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_owned(),
            count,
        })
        .collect()
}

/// Products at or below the stock threshold, lowest stock first.
#[must_use]
pub fn low_stock(products: &[Product], threshold: u32) -> Vec<&Product> {
    let mut low: Vec<&Product> = products.iter().filter(|p| p.stock <= threshold).collect();
    low.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
    low
}
