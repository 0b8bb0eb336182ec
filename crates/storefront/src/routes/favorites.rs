//! Favorite product handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bloom_core::catalog::Product;
use bloom_core::types::ProductId;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::session::{load_favorites, save_favorites};
use crate::state::AppState;

/// Toggle result.
#[derive(Debug, Serialize)]
pub struct FavoriteState {
    pub product_id: ProductId,
    pub favorite: bool,
}

/// Favorite products in the order they were added. Deleted products are skipped.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Product>>> {
    let favorites = load_favorites(&session).await?;
    let products = state.products().all().await?;
    let listed = favorites
        .ids()
        .iter()
        .filter_map(|id| products.iter().find(|p| &p.id == id).cloned())
        .collect();
    Ok(Json(listed))
}

/// Flip a product's favorite state.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<FavoriteState>> {
    if state.products().get(&product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Product {product_id}")));
    }

    let mut favorites = load_favorites(&session).await?;
    let favorite = favorites.toggle(product_id.clone());
    save_favorites(&session, &favorites).await?;
    Ok(Json(FavoriteState {
        product_id,
        favorite,
    }))
}

/// Remove a favorite.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(product_id): Path<ProductId>) -> Result<StatusCode> {
    let mut favorites = load_favorites(&session).await?;
    if favorites.remove(&product_id) {
        save_favorites(&session, &favorites).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
