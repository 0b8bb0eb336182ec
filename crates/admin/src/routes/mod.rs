//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                - Liveness
//! GET  /health/ready                          - Store readiness
//!
//! # Auth (argon2 password, single account)
//! POST /auth/login                            - Start session
//! POST /auth/logout                           - End session
//! GET  /auth/me                               - Current admin
//!
//! # Everything below requires an admin session (401 otherwise)
//! GET  /api/dashboard                         - Headline metrics
//!
//! GET|POST            /api/products           - List (ProductFilter) / create
//! GET|PUT|DELETE      /api/products/{id}      - Read / partial update / delete
//! POST                /api/products/{id}/stock - Adjust stock by delta
//!
//! GET                 /api/orders             - ?status=&q=&from=&to=
//! GET|DELETE          /api/orders/{id}
//! PUT                 /api/orders/{id}/status - Unconditional status write
//!
//! GET|POST            /api/customers          - ?q= / create
//! POST                /api/customers/recompute
//! GET|PUT|DELETE      /api/customers/{id}
//! GET                 /api/customers/{id}/orders
//!
//! GET                 /api/feedback           - ?status=
//! PUT|DELETE          /api/feedback/{id}
//!
//! GET  /api/chat/conversations
//! GET  /api/chat/conversations/{id}
//! POST /api/chat/conversations/{id}/reply
//!
//! GET  /api/finance/report                    - ?from=&to=&granularity=
//! GET  /api/events                            - SSE change feed
//! ```

pub mod auth;
pub mod chat;
pub mod customers;
pub mod dashboard;
pub mod events;
pub mod feedback;
pub mod finance;
pub mod orders;
pub mod products;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Create the authenticated `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/dashboard", dashboard::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/customers", customers::router())
        .nest("/feedback", feedback::router())
        .nest("/chat", chat::router())
        .nest("/finance", finance::router())
        .nest("/events", events::router())
        .route_layer(axum::middleware::from_extractor::<RequireAdminAuth>())
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth::router())
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
