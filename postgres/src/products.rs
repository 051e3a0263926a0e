//! Product catalog reads.

use crate::{db_error, decode_error};
use async_trait::async_trait;
use sqlx::PgPool;
use storefront_core::stores::{ProductStore, StoreError};
use storefront_core::types::{Money, Product, ProductId, ProductStock};

/// `PostgreSQL`-backed product catalog.
///
/// Stock is stored as JSONB in the shape the domain type serializes to:
/// `{"unsized": 5}` or `{"sized": {"M": 3, "L": 0}}`.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Creates a store over the given pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row: Option<(String, i64, serde_json::Value)> = sqlx::query_as(
            "SELECT name, price_cents, stock FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetch product", &e))?;

        let Some((name, price_cents, stock_json)) = row else {
            return Ok(None);
        };
        let stock: ProductStock =
            serde_json::from_value(stock_json).map_err(|e| decode_error("product stock", &e))?;

        // Prices are non-negative in our domain
        #[allow(clippy::cast_sign_loss)]
        let price = Money::from_cents(price_cents.max(0) as u64);
        Ok(Some(Product {
            id: *id,
            name,
            price,
            stock,
        }))
    }
}
