//! Dashboard overview.

use axum::{Json, Router, extract::State, routing::get};
use bloom_core::chat::Feedback;
use bloom_core::customer::Customer;
use bloom_core::finance::DashboardMetrics;
use bloom_store::{OrderRepository, ProductRepository};
use chrono::Utc;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show))
}

/// Headline metrics for the back-office landing view.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<DashboardMetrics>> {
    let store = state.store();
    let product_repo = ProductRepository::new(store);
    let order_repo = OrderRepository::new(store);
    let (products, orders, customers, feedback) = tokio::try_join!(
        product_repo.all(),
        order_repo.all(),
        store.all::<Customer>(),
        store.all::<Feedback>(),
    )?;

    Ok(Json(DashboardMetrics::build(
        &products,
        &orders,
        &customers,
        &feedback,
        Utc::now(),
    )))
}
