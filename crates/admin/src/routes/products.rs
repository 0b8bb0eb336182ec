//! Product management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use bloom_core::catalog::{NewProduct, Product, ProductFilter, ProductUpdate};
use bloom_core::types::ProductId;
use bloom_store::ProductRepository;
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Stock adjustment; negative deltas remove units, floored at zero.
#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/{id}", get(show).put(update).delete(destroy))
        .route("/{id}/stock", post(adjust_stock))
}

/// Filtered listing. Unlike the storefront, failures are reported.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.store()).list(&filter).await?))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.store())
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

#[instrument(skip(state, input), fields(name = %input.name))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductRepository::new(state.store())
        .create(input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, update))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.store())
        .update(&id, update, Utc::now())
        .await?;
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.store()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<StockAdjustment>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.store())
        .adjust_stock(&id, input.delta, Utc::now())
        .await?;
    tracing::info!(product_id = %id, delta = input.delta, stock = product.stock, "Stock adjusted");
    Ok(Json(product))
}
