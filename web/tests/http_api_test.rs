//! HTTP API integration tests.
//!
//! Exercises routing, the customer-identity extractor, and the
//! domain-to-HTTP mappings against in-memory stores. The business logic
//! itself is covered in `storefront-testing`'s suites; these tests verify
//! the HTTP contract on top of it.

#![allow(clippy::expect_used)] // Integration tests can use expect for setup

use axum::http::header::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront_core::cart::CartService;
use storefront_core::eligibility::EligibilityEngine;
use storefront_core::policy::VipPolicy;
use storefront_core::types::{CustomerId, Product};
use storefront_testing::helpers::{profile, sized_product};
use storefront_testing::mocks::{
    test_clock, FixedSelection, InMemoryCarts, InMemoryCoupons, InMemoryOrderHistory,
    InMemoryProducts, SequentialCodes,
};
use storefront_web::{build_router, AppState};

struct Fixture {
    server: TestServer,
    orders: Arc<InMemoryOrderHistory>,
    products: Arc<InMemoryProducts>,
}

fn fixture() -> Fixture {
    let orders = Arc::new(InMemoryOrderHistory::new());
    let coupons = Arc::new(InMemoryCoupons::new());
    let products = Arc::new(InMemoryProducts::new());
    let carts = Arc::new(InMemoryCarts::new());
    let clock = Arc::new(test_clock());

    let engine = EligibilityEngine::new(
        orders.clone(),
        coupons,
        clock.clone(),
        Arc::new(FixedSelection(true)),
        Arc::new(SequentialCodes::new()),
        VipPolicy::default(),
    );
    let cart = CartService::new(products.clone(), carts, clock);

    let server = TestServer::new(build_router(AppState::new(engine, cart)))
        .expect("test server");
    Fixture {
        server,
        orders,
        products,
    }
}

fn identity(customer: CustomerId) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-customer-id"),
        HeaderValue::from_str(&customer.to_string()).expect("valid header"),
    )
}

#[tokio::test]
async fn health_endpoints_respond() {
    let fx = fixture();
    let response = fx.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");

    fx.server.get("/ready").await.assert_status_ok();
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let fx = fixture();
    let response = fx.server.get("/api/vip/eligibility").await;
    response.assert_status_unauthorized();

    let (name, _) = identity(CustomerId::new());
    let response = fx
        .server
        .get("/api/vip/eligibility")
        .add_header(name, HeaderValue::from_static("not-a-uuid"))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn eligibility_reports_for_qualified_customer() {
    let fx = fixture();
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    let (name, value) = identity(customer);
    let response = fx
        .server
        .get("/api/vip/eligibility")
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["is_eligible"], true);
    assert_eq!(body["tier"], "platinum");
    assert_eq!(body["order_count"], 10);
    assert_eq!(body["has_vip_coupon"], false);
}

#[tokio::test]
async fn claim_issues_then_reports_existing() {
    let fx = fixture();
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    let (name, value) = identity(customer);
    let response = fx
        .server
        .post("/api/vip/claim")
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["outcome"], "issued");
    assert_eq!(body["tier"], "platinum");
    assert_eq!(body["coupon"]["discount_percent"], 35);

    // The second claim is a normal 200 outcome with a distinguishable reason.
    let response = fx
        .server
        .post("/api/vip/claim")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["reason"], "already_has_vip_coupon");
    assert!(body["existing_coupon"]["code"].is_string());
}

#[tokio::test]
async fn batch_endpoint_returns_summary() {
    let fx = fixture();
    fx.orders.put_profile(profile(CustomerId::new(), 2_500, 10));
    fx.orders.put_profile(profile(CustomerId::new(), 100, 1));

    let response = fx.server.post("/api/admin/vip/evaluations").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["created"], 1);
    assert_eq!(body["details"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn cart_flow_over_http() {
    let fx = fixture();
    let shirt: Product = sized_product("Shirt", 25, &[("M", 3), ("L", 0)]);
    fx.products.put(shirt.clone());
    let customer = CustomerId::new();
    let (name, value) = identity(customer);

    // Sold-out size is a 409 with the available count in the message.
    let response = fx
        .server
        .post("/api/cart/items")
        .add_header(name.clone(), value.clone())
        .json(&json!({"product_id": shirt.id.as_uuid(), "size": "L", "quantity": 1}))
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert!(body["message"]
        .as_str()
        .expect("message present")
        .contains("only 0 available"));

    // A fitting add returns the priced cart.
    let response = fx
        .server
        .post("/api/cart/items")
        .add_header(name.clone(), value.clone())
        .json(&json!({"product_id": shirt.id.as_uuid(), "size": "M", "quantity": 2}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["lines"][0]["quantity"], 2);
    assert_eq!(body["total"], 5_000);

    // Quantity updates go through the line key.
    let key = format!("{}-M", shirt.id);
    let response = fx
        .server
        .put(&format!("/api/cart/items/{key}"))
        .add_header(name.clone(), value.clone())
        .json(&json!({"quantity": 3}))
        .await;
    response.assert_status_ok();

    let response = fx
        .server
        .put(&format!("/api/cart/items/{key}"))
        .add_header(name.clone(), value.clone())
        .json(&json!({"quantity": -2}))
        .await;
    assert_eq!(response.status_code(), 422);

    // Malformed keys are a client error, not a 500.
    let response = fx
        .server
        .put("/api/cart/items/not-a-key")
        .add_header(name.clone(), value.clone())
        .json(&json!({"quantity": 1}))
        .await;
    assert_eq!(response.status_code(), 400);

    // Removal is idempotent; clearing empties the cart.
    let response = fx
        .server
        .delete(&format!("/api/cart/items/{key}"))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let response = fx
        .server
        .delete(&format!("/api/cart/items/{key}"))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();

    let response = fx
        .server
        .delete("/api/cart")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["lines"].as_array().map(Vec::len), Some(0));
}
