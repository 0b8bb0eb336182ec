//! Order management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use bloom_core::order::{Order, OrderFilter};
use bloom_core::types::{CustomerId, OrderId, OrderStatus};
use bloom_store::{CustomerRepository, OrderRepository, RepositoryError};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{id}", get(show).delete(destroy))
        .route("/{id}/status", put(set_status))
}

/// Orders matching `?status=&q=&from=&to=`, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.store()).list(&filter).await?))
}

#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<OrderId>) -> Result<Json<Order>> {
    OrderRepository::new(state.store())
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Write the new status. Any status may follow any other.
#[instrument(skip(state, input), fields(status = %input.status))]
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(input): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.store())
        .set_status(&id, input.status, Utc::now())
        .await?;
    // Cancelling or restoring an order moves the buyer's totals.
    refresh_customer(&state, order.customer_id.as_ref()).await?;
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn destroy(State(state): State<AppState>, Path(id): Path<OrderId>) -> Result<StatusCode> {
    let orders = OrderRepository::new(state.store());
    let customer_id = orders.get(&id).await?.and_then(|o| o.customer_id);
    orders.delete(&id).await?;
    refresh_customer(&state, customer_id.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_customer(state: &AppState, customer_id: Option<&CustomerId>) -> Result<()> {
    let Some(customer_id) = customer_id else {
        return Ok(());
    };
    let orders = OrderRepository::new(state.store()).all().await?;
    match CustomerRepository::new(state.store())
        .refresh_aggregates(customer_id, &orders, Utc::now())
        .await
    {
        Ok(_) | Err(RepositoryError::NotFound) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
