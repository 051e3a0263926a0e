//! Cart documents with a transactional stock re-check.
//!
//! The domain service validates stock before writing, but two concurrent
//! requests can both pass that check on the same stale read. Writes that
//! *raise* a line's quantity therefore re-check the product's current stock
//! inside the same transaction, with the product row locked; a line that
//! no longer fits maps to `Conflict(StockCeiling)`. Writes that only lower
//! or drop lines (the self-healing read pass, removals) are never blocked.

use crate::{db_error, decode_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use storefront_core::stores::{CartStore, ConflictKind, StoreError};
use storefront_core::types::{Cart, CartLine, CustomerId, ProductId, ProductStock};

/// `PostgreSQL`-backed cart store.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Creates a store over the given pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Re-checks every quantity-raising line against current stock with the
    /// product rows locked for the rest of the transaction.
    async fn check_raised_lines(
        tx: &mut Transaction<'_, Postgres>,
        cart: &Cart,
        prior: &HashMap<(ProductId, Option<String>), u32>,
    ) -> Result<(), StoreError> {
        for line in &cart.lines {
            let held = prior
                .get(&(line.product_id, line.size.clone()))
                .copied()
                .unwrap_or(0);
            if line.quantity <= held {
                continue;
            }

            let row: Option<(serde_json::Value,)> =
                sqlx::query_as("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                    .bind(line.product_id.as_uuid())
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(|e| db_error("lock product stock", &e))?;

            // A vanished product is the read pass's problem, not a write
            // conflict.
            let Some((stock_json,)) = row else {
                continue;
            };
            let stock: ProductStock = serde_json::from_value(stock_json)
                .map_err(|e| decode_error("product stock", &e))?;

            // Sized line without a size: availability is undeterminable, so
            // the check cannot apply.
            let Some(available) = stock.available_for(line.size.as_deref()) else {
                continue;
            };
            if line.quantity > available {
                tracing::debug!(
                    customer = %cart.customer_id,
                    product = %line.product_id,
                    quantity = line.quantity,
                    available,
                    "cart write lost a stock race"
                );
                return Err(StoreError::Conflict(ConflictKind::StockCeiling));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn cart(&self, customer: &CustomerId) -> Result<Option<Cart>, StoreError> {
        let row: Option<(serde_json::Value, DateTime<Utc>)> =
            sqlx::query_as("SELECT lines, updated_at FROM carts WHERE customer_id = $1")
                .bind(customer.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("fetch cart", &e))?;

        let Some((lines_json, updated_at)) = row else {
            return Ok(None);
        };
        let lines: Vec<CartLine> =
            serde_json::from_value(lines_json).map_err(|e| decode_error("cart lines", &e))?;
        Ok(Some(Cart {
            customer_id: *customer,
            lines,
            updated_at,
        }))
    }

    async fn put_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin cart write", &e))?;

        let existing: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT lines FROM carts WHERE customer_id = $1 FOR UPDATE")
                .bind(cart.customer_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("lock cart", &e))?;

        let prior: HashMap<(ProductId, Option<String>), u32> = match existing {
            Some((lines_json,)) => {
                let lines: Vec<CartLine> = serde_json::from_value(lines_json)
                    .map_err(|e| decode_error("cart lines", &e))?;
                lines
                    .into_iter()
                    .map(|l| ((l.product_id, l.size), l.quantity))
                    .collect()
            }
            None => HashMap::new(),
        };

        Self::check_raised_lines(&mut tx, cart, &prior).await?;

        let lines_json = serde_json::to_value(&cart.lines)
            .map_err(|e| decode_error("encode cart lines", &e))?;
        sqlx::query(
            "INSERT INTO carts (customer_id, lines, updated_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (customer_id)
             DO UPDATE SET lines = EXCLUDED.lines, updated_at = EXCLUDED.updated_at",
        )
        .bind(cart.customer_id.as_uuid())
        .bind(lines_json)
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("upsert cart", &e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit cart write", &e))
    }

    async fn delete_cart(&self, customer: &CustomerId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM carts WHERE customer_id = $1")
            .bind(customer.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete cart", &e))?;
        Ok(())
    }
}
