//! Catalog route handlers.
//!
//! Listing reads never fail the page: a store error is logged and the
//! shopper sees an empty catalog.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bloom_core::catalog::{CategoryCount, Product, ProductFilter};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// List products matching the query filter.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Json<Vec<Product>> {
    let products = state.products().list(&filter).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to list products");
        Vec::new()
    });
    Json(products)
}

/// Product detail by id or slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<Product>> {
    state
        .products()
        .find(&id_or_slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product {id_or_slug}")))
}

/// Categories with product counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Json<Vec<CategoryCount>> {
    let categories = state.products().categories().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to list categories");
        Vec::new()
    });
    Json(categories)
}
