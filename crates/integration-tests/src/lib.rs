//! Integration tests for Bloom.
//!
//! Both routers are driven in-process with `tower::ServiceExt::oneshot`
//! over a temporary local data directory and in-memory sessions, so no
//! database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bloom-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront` - Cart, checkout, tracking, chat and feedback flows
//! - `admin` - Login, CRUD, order status and reports
//! - `local_store` - Persistence of the JSON file backend

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::Path;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use bloom_core::catalog::{NewProduct, Product};
use bloom_core::types::Email;
use bloom_store::{ProductRepository, Store, StoreConfig};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

/// Back-office login used by [`admin_app`].
pub const ADMIN_EMAIL: &str = "owner@bloom.test";
/// Password matching the hash configured by [`admin_app`].
pub const ADMIN_PASSWORD: &str = "test-password-123";

/// Rate limiters key on the client IP header.
const CLIENT_IP: &str = "203.0.113.7";

/// Geocoder address nothing listens on; lookups fail fast.
const DEAD_GEOCODER: &str = "http://127.0.0.1:9";

/// Storefront router over `dir`.
pub async fn storefront_app(dir: &Path) -> Router {
    let mut config = bloom_storefront::config::StorefrontConfig::new(StoreConfig::local(dir));
    config.geocoder.base_url = DEAD_GEOCODER.to_string();
    let store = Store::local(dir).await.unwrap();
    let state = bloom_storefront::state::AppState::new(config, store).unwrap();
    bloom_storefront::app(state, MemoryStore::default())
}

/// Admin router over `dir` with the [`ADMIN_EMAIL`] account.
pub async fn admin_app(dir: &Path) -> Router {
    use bloom_admin::config::{AdminConfig, AdminCredentials};

    let hash = bloom_admin::services::hash_password(ADMIN_PASSWORD).unwrap();
    let credentials =
        AdminCredentials::new(Email::parse(ADMIN_EMAIL).unwrap(), SecretString::from(hash))
            .unwrap();
    let config = AdminConfig::new(StoreConfig::local(dir), credentials);
    let store = Store::local(dir).await.unwrap();
    bloom_admin::app(
        bloom_admin::state::AppState::new(config, store),
        MemoryStore::default(),
    )
}

/// Insert a product directly into the data directory.
pub async fn seed_product(dir: &Path, name: &str, price: &str, stock: u32) -> Product {
    let store = Store::local(dir).await.unwrap();
    let input: NewProduct = serde_json::from_value(serde_json::json!({
        "name": name,
        "category": "bouquets",
        "price": price,
        "stock": stock,
    }))
    .unwrap();
    ProductRepository::new(&store)
        .create(input, Utc::now())
        .await
        .unwrap()
}

/// Parse a decimal string field such as `"95.00"`.
pub fn money(value: &Value) -> f64 {
    value.as_str().unwrap().parse().unwrap()
}

/// A response with its JSON body (`Null` when empty or not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Value,
}

/// Cookie-carrying client for one router, like a single browser.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub const fn new(router: Router) -> Self {
        Self {
            router,
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Status and headers only; the body is left unread (for streams).
    pub async fn head_of(&mut self, uri: &str) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(self.request(Method::GET, uri, None))
            .await
            .unwrap();
        TestResponse {
            status: response.status(),
            content_type: content_type(response.headers()),
            body: Value::Null,
        }
    }

    fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(self.request(method, uri, body))
            .await
            .unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            && let Some(pair) = set_cookie.split(';').next()
        {
            self.cookie = Some(pair.trim().to_string());
        }

        let status = response.status();
        let content_type = content_type(response.headers());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            content_type,
            body,
        }
    }
}

fn content_type(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
