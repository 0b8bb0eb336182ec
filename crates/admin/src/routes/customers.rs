//! Customer management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use bloom_core::customer::{Customer, CustomerUpdate, NewCustomer};
use bloom_core::order::Order;
use bloom_core::types::CustomerId;
use bloom_store::{CustomerRepository, OrderRepository};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Result of an aggregate recompute.
#[derive(Debug, Serialize)]
pub struct RecomputeResult {
    pub updated: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/recompute", post(recompute))
        .route("/{id}", get(show).put(update).delete(destroy))
        .route("/{id}/orders", get(orders))
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Customer>>> {
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    Ok(Json(CustomerRepository::new(state.store()).list(q).await?))
}

async fn load(state: &AppState, id: &CustomerId) -> Result<Customer> {
    CustomerRepository::new(state.store())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<Json<Customer>> {
    load(&state, &id).await.map(Json)
}

#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = CustomerRepository::new(state.store())
        .create(input, Utc::now())
        .await?;
    tracing::info!(customer_id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

#[instrument(skip(state, update))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(update): Json<CustomerUpdate>,
) -> Result<Json<Customer>> {
    let customer = CustomerRepository::new(state.store())
        .update(&id, update, Utc::now())
        .await?;
    Ok(Json(customer))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode> {
    CustomerRepository::new(state.store()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Orders placed with the customer's phone or email, newest first.
#[instrument(skip(state))]
pub async fn orders(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<Json<Vec<Order>>> {
    let customer = load(&state, &id).await?;
    Ok(Json(
        OrderRepository::new(state.store())
            .for_customer(&customer)
            .await?,
    ))
}

/// Recompute every customer's order totals from the order collection.
#[instrument(skip(state))]
pub async fn recompute(State(state): State<AppState>) -> Result<Json<RecomputeResult>> {
    let orders = OrderRepository::new(state.store()).all().await?;
    let updated = CustomerRepository::new(state.store())
        .recompute_all(&orders, Utc::now())
        .await?;
    Ok(Json(RecomputeResult { updated }))
}
