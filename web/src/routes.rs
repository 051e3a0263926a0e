//! Router configuration for the Storefront service.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::{cart, health, vip};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Configures all routes:
/// - Health checks
/// - VIP eligibility/claim endpoints and the admin batch sweep
/// - Cart endpoints
///
/// # Arguments
///
/// - `state`: Application state to share with handlers
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // VIP program
        .route("/vip/eligibility", get(vip::check_eligibility))
        .route("/vip/claim", post(vip::claim_coupon))
        .route("/admin/vip/evaluations", post(vip::run_batch_evaluation))
        // Cart
        .route("/cart", get(cart::read_cart))
        .route("/cart", delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_to_cart))
        .route("/cart/items/:key", put(cart::update_quantity))
        .route("/cart/items/:key", delete(cart::remove_line));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
