//! Storefront flows over the local file backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use bloom_integration_tests::{TestClient, money, seed_product, storefront_app};
use serde_json::json;

/// The default shop location; deliveries here cost the base fee.
const SHOP: (f64, f64) = (10.7769, 106.7009);

fn checkout_form() -> serde_json::Value {
    json!({
        "name": "Linh Tran",
        "phone": "0901 234 567",
        "email": "linh@example.com",
        "address_line1": "12 Le Loi",
        "city": "Ho Chi Minh City",
        "coordinates": { "lat": SHOP.0, "lon": SHOP.1 },
        "payment_method": "cash_on_delivery"
    })
}

#[tokio::test]
async fn test_cart_merges_and_checkout_places_order() {
    let dir = tempfile::tempdir().unwrap();
    let rose = seed_product(dir.path(), "Red Rose Bouquet", "45.00", 5).await;
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);

    let res = shopper
        .post("/api/cart/items", json!({ "product_id": rose.id, "quantity": 2 }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["item_count"], 2);

    // Same product again merges into one line.
    let res = shopper
        .post("/api/cart/items", json!({ "product_id": rose.id }))
        .await;
    assert_eq!(res.body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["item_count"], 3);

    let res = shopper
        .put(
            &format!("/api/cart/items/{}", rose.id),
            json!({ "quantity": 2 }),
        )
        .await;
    assert_eq!(res.body["item_count"], 2);
    assert!((money(&res.body["subtotal"]) - 90.0).abs() < f64::EPSILON);
    assert_eq!(shopper.get("/api/cart/count").await.body["count"], 2);

    let res = shopper.post("/api/checkout", checkout_form()).await;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    let order = res.body;
    assert_eq!(order["status"], "pending");
    assert!(order["order_number"].as_str().unwrap().starts_with("BL-"));
    assert!((money(&order["shipping_fee"]) - 5.0).abs() < f64::EPSILON);
    assert!((money(&order["total"]) - 95.0).abs() < f64::EPSILON);
    assert!(order["customer_id"].is_string());

    // Cart emptied, stock decremented.
    assert_eq!(shopper.get("/api/cart").await.body["item_count"], 0);
    let product = shopper.get(&format!("/api/products/{}", rose.id)).await;
    assert_eq!(product.body["stock"], 3);

    // Tracking needs the matching phone.
    let number = order["order_number"].as_str().unwrap();
    let res = shopper
        .get(&format!("/api/orders/track?order_number={number}&phone=0901234567"))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], order["id"]);
    let res = shopper
        .get(&format!("/api/orders/track?order_number={number}&phone=0999999999"))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart() {
    let dir = tempfile::tempdir().unwrap();
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);

    let res = shopper.post("/api/checkout", checkout_form()).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].is_string());
}

#[tokio::test]
async fn test_checkout_without_coordinates_falls_back_to_base_fee() {
    let dir = tempfile::tempdir().unwrap();
    let lily = seed_product(dir.path(), "White Lily", "30.00", 4).await;
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);
    shopper
        .post("/api/cart/items", json!({ "product_id": lily.id }))
        .await;

    let mut form = checkout_form();
    form.as_object_mut().unwrap().remove("coordinates");
    let res = shopper.post("/api/checkout", form).await;

    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    assert!((money(&res.body["shipping_fee"]) - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let rose = seed_product(dir.path(), "Red Rose Bouquet", "45.00", 5).await;
    let app = storefront_app(dir.path()).await;
    let mut alice = TestClient::new(app.clone());
    let mut bob = TestClient::new(app);

    alice
        .post("/api/cart/items", json!({ "product_id": rose.id }))
        .await;
    assert_eq!(alice.get("/api/cart/count").await.body["count"], 1);
    assert_eq!(bob.get("/api/cart/count").await.body["count"], 0);
}

#[tokio::test]
async fn test_out_of_stock_cannot_be_added() {
    let dir = tempfile::tempdir().unwrap();
    let gone = seed_product(dir.path(), "Peony", "50.00", 0).await;
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);

    let res = shopper
        .post("/api/cart/items", json!({ "product_id": gone.id }))
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = shopper
        .post("/api/cart/items", json!({ "product_id": "no-such-product" }))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorites_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let rose = seed_product(dir.path(), "Red Rose Bouquet", "45.00", 5).await;
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);
    let uri = format!("/api/favorites/{}", rose.id);

    assert_eq!(shopper.post(&uri, json!({})).await.body["favorite"], true);
    let favorites = shopper.get("/api/favorites").await;
    assert_eq!(favorites.body.as_array().unwrap().len(), 1);
    assert_eq!(favorites.body[0]["slug"], "red-rose-bouquet");

    assert_eq!(shopper.post(&uri, json!({})).await.body["favorite"], false);
    assert!(shopper.get("/api/favorites").await.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_catalog_listing_and_categories() {
    let dir = tempfile::tempdir().unwrap();
    seed_product(dir.path(), "Red Rose Bouquet", "45.00", 5).await;
    seed_product(dir.path(), "Tulip Bunch", "25.00", 5).await;
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);

    let products = shopper.get("/api/products").await;
    assert_eq!(products.status, StatusCode::OK);
    assert_eq!(products.body.as_array().unwrap().len(), 2);

    let by_slug = shopper.get("/api/products/tulip-bunch").await;
    assert_eq!(by_slug.body["name"], "Tulip Bunch");

    let categories = shopper.get("/api/categories").await;
    assert_eq!(categories.body[0]["name"], "bouquets");
    assert_eq!(categories.body[0]["count"], 2);
}

#[tokio::test]
async fn test_shipping_estimate() {
    let dir = tempfile::tempdir().unwrap();
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);

    let near = shopper
        .post(
            "/api/shipping/estimate",
            json!({ "coordinates": { "lat": SHOP.0, "lon": SHOP.1 }, "subtotal": "20.00" }),
        )
        .await;
    assert_eq!(near.status, StatusCode::OK);
    assert_eq!(near.body["free_shipping"], false);
    assert!((money(&near.body["fee"]) - 5.0).abs() < f64::EPSILON);

    let free = shopper
        .post(
            "/api/shipping/estimate",
            json!({ "coordinates": { "lat": SHOP.0, "lon": SHOP.1 }, "subtotal": "150.00" }),
        )
        .await;
    assert_eq!(free.body["free_shipping"], true);

    // Hanoi is far outside the delivery radius.
    let far = shopper
        .post(
            "/api/shipping/estimate",
            json!({ "coordinates": { "lat": 21.0285, "lon": 105.8542 } }),
        )
        .await;
    assert_eq!(far.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_chat_widget_replies_and_polls() {
    let dir = tempfile::tempdir().unwrap();
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);

    let res = shopper
        .post("/api/chat/messages", json!({ "body": "What are your opening hours?" }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let messages = res.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender"], "customer");
    assert_eq!(messages[1]["sender"], "bot");

    // The conversation is remembered by the session.
    let poll = shopper.get("/api/chat/messages").await;
    assert_eq!(poll.body["conversation_id"], res.body["conversation_id"]);
    assert_eq!(poll.body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_feedback_submission() {
    let dir = tempfile::tempdir().unwrap();
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);

    let res = shopper
        .post(
            "/api/feedback",
            json!({ "name": "Minh", "rating": 5, "message": "Beautiful roses, on time." }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["status"], "new");

    let bad = shopper
        .post(
            "/api/feedback",
            json!({ "name": "Minh", "rating": 9, "message": "??" }),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = TestClient::new(storefront_app(dir.path()).await);
    assert_eq!(client.get("/health").await.status, StatusCode::OK);
    assert_eq!(client.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_direct_client_without_proxy_headers() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let dir = tempfile::tempdir().unwrap();
    seed_product(dir.path(), "Red Rose Bouquet", "45.00", 5).await;
    let app = storefront_app(dir.path()).await;

    let response = app
        .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_widget_can_keep_polling() {
    let dir = tempfile::tempdir().unwrap();
    let mut shopper = TestClient::new(storefront_app(dir.path()).await);
    shopper
        .post("/api/chat/messages", json!({ "body": "Hello" }))
        .await;

    for attempt in 0..15 {
        let poll = shopper.get("/api/chat/messages").await;
        assert_eq!(poll.status, StatusCode::OK, "poll {attempt}");
        assert_eq!(poll.body["messages"].as_array().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn test_chat_stays_within_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = storefront_app(dir.path()).await;
    let mut alice = TestClient::new(app.clone());
    let mut mallory = TestClient::new(app);

    let started = alice
        .post("/api/chat/messages", json!({ "body": "Do you have peonies?" }))
        .await;
    let theirs = started.body["conversation_id"].as_str().unwrap().to_string();

    let res = mallory
        .post(
            "/api/chat/messages",
            json!({ "conversation_id": theirs, "body": "Cancel my order" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_ne!(res.body["conversation_id"], theirs.as_str());

    let peek = mallory
        .get(&format!("/api/chat/messages?conversation_id={theirs}"))
        .await;
    assert_ne!(peek.body["conversation_id"], theirs.as_str());
    assert!(peek.body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["body"] != "Do you have peonies?"));

    let poll = alice.get("/api/chat/messages").await;
    assert_eq!(poll.body["messages"].as_array().unwrap().len(), 2);
}
