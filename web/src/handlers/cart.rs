//! Cart API endpoints.
//!
//! - `GET    /api/cart` - Read the caller's cart (runs the self-healing pass)
//! - `POST   /api/cart/items` - Add a product (and size) to the cart
//! - `PUT    /api/cart/items/{key}` - Set a line's quantity
//! - `DELETE /api/cart/items/{key}` - Remove one line (idempotent)
//! - `DELETE /api/cart` - Clear the cart
//!
//! Line keys are `<product-uuid>` or `<product-uuid>-<size>`.

use crate::error::AppError;
use crate::extractors::SessionCustomer;
use crate::metrics;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use storefront_core::cart::{CartError, CartView};
use storefront_core::types::{CartLineKey, ProductId};
use uuid::Uuid;

/// Request to add a product to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Product to add
    pub product_id: Uuid,
    /// Size selection (required for sized products)
    pub size: Option<String>,
    /// Units to add; defaults to 1
    pub quantity: Option<i64>,
}

/// Request to set a line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    /// New quantity for the line
    pub quantity: i64,
}

/// Converts a signed wire quantity to the domain's `u32`, rejecting
/// non-positive values the way the stock validator does.
fn wire_quantity(raw: i64) -> Result<u32, AppError> {
    u32::try_from(raw).ok().filter(|q| *q > 0).map_or_else(
        || Err(CartError::InvalidQuantity.into()),
        Ok,
    )
}

fn parse_line_key(raw: &str) -> Result<CartLineKey, AppError> {
    CartLineKey::parse(raw)
        .ok_or_else(|| AppError::bad_request(format!("malformed cart line key {raw:?}")))
}

/// Read the caller's cart.
pub async fn read_cart(
    SessionCustomer(customer_id): SessionCustomer,
    State(state): State<AppState>,
) -> Result<Json<CartView>, AppError> {
    let view = state.cart.read_cart(customer_id).await?;
    Ok(Json(view))
}

/// Add a product to the cart.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/cart/items \
///   -H "X-Customer-Id: 550e8400-e29b-41d4-a716-446655440000" \
///   -H "Content-Type: application/json" \
///   -d '{"product_id": "660e8400-e29b-41d4-a716-446655440001", "size": "M", "quantity": 2}'
/// ```
pub async fn add_to_cart(
    SessionCustomer(customer_id): SessionCustomer,
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>, AppError> {
    let quantity = wire_quantity(request.quantity.unwrap_or(1))?;
    let product_id = ProductId::from_uuid(request.product_id);

    match state
        .cart
        .add_to_cart(customer_id, product_id, request.size, quantity)
        .await
    {
        Ok(view) => {
            metrics::record_cart_mutation("add");
            Ok(Json(view))
        }
        Err(err) => {
            metrics::record_cart_rejection(&err);
            Err(err.into())
        }
    }
}

/// Set a line's quantity, re-validating against current stock.
pub async fn update_quantity(
    SessionCustomer(customer_id): SessionCustomer,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>, AppError> {
    let key = parse_line_key(&key)?;
    let quantity = wire_quantity(request.quantity)?;

    match state
        .cart
        .update_quantity(customer_id, &key, quantity)
        .await
    {
        Ok(view) => {
            metrics::record_cart_mutation("update");
            Ok(Json(view))
        }
        Err(err) => {
            metrics::record_cart_rejection(&err);
            Err(err.into())
        }
    }
}

/// Remove one line from the cart. Removing a line that does not exist
/// succeeds (idempotent deletion).
pub async fn remove_line(
    SessionCustomer(customer_id): SessionCustomer,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<CartView>, AppError> {
    let key = parse_line_key(&key)?;
    let view = state.cart.remove_line(customer_id, Some(&key)).await?;
    metrics::record_cart_mutation("remove");
    Ok(Json(view))
}

/// Clear the caller's cart entirely.
pub async fn clear_cart(
    SessionCustomer(customer_id): SessionCustomer,
    State(state): State<AppState>,
) -> Result<Json<CartView>, AppError> {
    let view = state.cart.remove_line(customer_id, None).await?;
    metrics::record_cart_mutation("clear");
    Ok(Json(view))
}
