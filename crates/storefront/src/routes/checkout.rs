//! Checkout: turn the session cart into a pending order.

use axum::{Json, extract::State, http::StatusCode};
use bloom_core::order::{CheckoutError, CheckoutRequest, Order};
use bloom_store::{CustomerRepository, OrderRepository};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::session::{load_cart, save_cart};
use crate::routes::cart::price_cart;
use crate::state::AppState;

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Place an order from the session cart.
///
/// Stock is checked against the catalog at the time of the request and
/// decremented after the order is stored; concurrent checkouts of the last
/// unit can both succeed and leave stock at zero.
#[instrument(
    skip(state, session, request),
    fields(order_id = tracing::field::Empty, order_number = tracing::field::Empty)
)]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let now = Utc::now();
    let mut checkout = request.validate(now.date_naive())?;

    let mut cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }
    let priced = price_cart(&state, &cart).await?;
    if !priced.missing.is_empty() {
        return Err(AppError::Conflict(
            "Some items in your cart are no longer available".to_string(),
        ));
    }
    if let Some(line) = priced.over_stock().first() {
        return Err(AppError::Conflict(format!(
            "Only {} of {} left in stock",
            line.available, line.name
        )));
    }

    let fee = state
        .delivery()
        .checkout_fee(
            checkout.address.coordinates,
            &checkout.address.one_line(),
            priced.subtotal,
        )
        .await?;
    checkout.address.coordinates = fee.coordinates;

    let store = state.store();
    let mut order = Order::place(checkout, &priced, fee.fee, now)?;
    let customers = CustomerRepository::new(store);
    let customer = customers.upsert_from_order(&order, now).await?;
    order.customer_id = Some(customer.id.clone());

    let orders = OrderRepository::new(store);
    let order = orders.create(order).await?;
    state.products().decrement_stock(&order.items, now).await?;
    customers
        .refresh_aggregates(&customer.id, &orders.all().await?, now)
        .await?;

    cart.clear();
    save_cart(&session, &cart).await?;

    tracing::Span::current()
        .record("order_id", order.id.as_str())
        .record("order_number", order.order_number.as_str());
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", order.order_number.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(order)))
}
