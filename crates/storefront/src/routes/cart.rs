//! Cart route handlers.
//!
//! The cart lives in the session as `(product, quantity)` lines and is
//! priced against the current catalog on every read.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bloom_core::cart::{Cart, CartError, PricedCart, price};
use bloom_core::catalog::Product;
use bloom_core::types::ProductId;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::session::{load_cart, save_cart};
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: u32,
}

/// Cart badge count.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Price a cart against the current catalog.
pub(crate) async fn price_cart(state: &AppState, cart: &Cart) -> Result<PricedCart> {
    let products = state.products().all().await?;
    let by_id: HashMap<&ProductId, &Product> = products.iter().map(|p| (&p.id, p)).collect();
    Ok(price(cart, |id| by_id.get(id).copied()))
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::OutOfStock(_) => Self::Conflict(err.to_string()),
            CartError::LineNotFound(_) => Self::NotFound(err.to_string()),
        }
    }
}

/// Show the priced cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<PricedCart>> {
    let cart = load_cart(&session).await?;
    Ok(Json(price_cart(&state, &cart).await?))
}

/// Add a product, merging with an existing line.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(item): Json<AddItem>,
) -> Result<Json<PricedCart>> {
    let product = state
        .products()
        .get(&item.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", item.product_id)))?;

    let mut cart = load_cart(&session).await?;
    let quantity = cart.add(product.id.clone(), item.quantity, product.stock)?;
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product_id", product.id.as_str()),
            ("quantity", &quantity.to_string()),
        ]),
    );
    Ok(Json(price_cart(&state, &cart).await?))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(body): Json<SetQuantity>,
) -> Result<Json<PricedCart>> {
    let available = state
        .products()
        .get(&product_id)
        .await?
        .map_or(0, |p| p.stock);

    let mut cart = load_cart(&session).await?;
    cart.set_quantity(&product_id, body.quantity, available)?;
    save_cart(&session, &cart).await?;
    Ok(Json(price_cart(&state, &cart).await?))
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<PricedCart>> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(&product_id) {
        save_cart(&session, &cart).await?;
    }
    Ok(Json(price_cart(&state, &cart).await?))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    save_cart(&session, &Cart::new()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Number of units in the cart.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.item_count(),
    }))
}
