//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Store readiness
//!
//! # Catalog
//! GET  /api/products                    - Filtered product listing
//! GET  /api/products/{id}               - Product by id or slug
//! GET  /api/categories                  - Category counts
//!
//! # Cart (session)
//! GET    /api/cart                      - Priced cart
//! DELETE /api/cart                      - Clear
//! GET    /api/cart/count                - Unit count
//! POST   /api/cart/items                - Merge-add a product
//! PUT    /api/cart/items/{product_id}   - Set quantity (0 removes)
//! DELETE /api/cart/items/{product_id}   - Remove line
//!
//! # Favorites (session)
//! GET    /api/favorites                 - Favorite products
//! POST   /api/favorites/{product_id}    - Toggle
//! DELETE /api/favorites/{product_id}    - Remove
//!
//! # Orders
//! POST /api/shipping/estimate           - Delivery quote
//! POST /api/checkout                    - Place order (rate limited)
//! GET  /api/orders/track                - Lookup by number and phone
//!
//! # Contact
//! POST /api/chat/messages               - Customer message + bot reply (rate limited)
//! GET  /api/chat/messages               - Poll a conversation (API limiter)
//! POST /api/feedback                    - Feedback form (rate limited)
//! ```

pub mod cart;
pub mod chat;
pub mod checkout;
pub mod favorites;
pub mod feedback;
pub mod orders;
pub mod products;
pub mod shipping;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, submit_rate_limiter};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            put(cart::update).delete(cart::remove),
        )
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route(
            "/{product_id}",
            post(favorites::toggle).delete(favorites::remove),
        )
}

/// Form submissions, behind the stricter rate limiter.
fn submit_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::place))
        .route("/feedback", post(feedback::submit))
        .route("/chat/messages", post(chat::post_message))
        .layer(submit_rate_limiter())
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(products::categories))
        .nest("/cart", cart_routes())
        .nest("/favorites", favorite_routes())
        .route("/shipping/estimate", post(shipping::estimate))
        .route("/orders/track", get(orders::track))
        .route("/chat/messages", get(chat::messages))
        .layer(api_rate_limiter())
        .merge(submit_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request};
    use bloom_store::{Store, StoreConfig};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use crate::config::StorefrontConfig;

    use super::*;

    async fn app(dir: &std::path::Path) -> Router {
        let config = StorefrontConfig::new(StoreConfig::local(dir));
        let store = Store::local(dir).await.unwrap();
        crate::app(AppState::new(config, store).unwrap(), MemoryStore::default())
    }

    async fn status_of(app: &Router, uri: &str) -> StatusCode {
        app.clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_api_served_without_proxy_headers() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;
        for uri in ["/api/products", "/api/categories", "/api/cart", "/api/chat/messages"] {
            assert_eq!(status_of(&app, uri).await, StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_chat_polling_uses_read_limits() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;
        // Well past the submission burst of 10.
        for attempt in 0..15 {
            assert_eq!(
                status_of(&app, "/api/chat/messages").await,
                StatusCode::OK,
                "poll {attempt}"
            );
        }
    }
}
