//! Public order tracking.

use axum::{
    Json,
    extract::{Query, State},
};
use bloom_core::order::Order;
use bloom_core::types::Phone;
use bloom_store::OrderRepository;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Tracking lookup query.
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub order_number: String,
    pub phone: String,
}

/// Look up an order by number and the buyer's or recipient's phone.
///
/// A wrong phone answers 404, same as an unknown number.
#[instrument(skip(state, query), fields(order_number = %query.order_number))]
pub async fn track(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Order>> {
    let phone = Phone::parse(&query.phone).map_err(|e| AppError::BadRequest(e.to_string()))?;
    OrderRepository::new(state.store())
        .track(&query.order_number, &phone)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}
