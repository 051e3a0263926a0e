//! `PostgreSQL` store implementations for Storefront.
//!
//! Backs the `storefront-core` store traits with sqlx/`PostgreSQL`:
//!
//! - [`PgOrderHistoryStore`]: on-demand spending aggregation over completed
//!   orders (SUM/COUNT/MIN/MAX grouped by customer)
//! - [`PgCouponStore`]: coupon persistence with code uniqueness and a
//!   partial unique index enforcing one active program coupon per customer
//! - [`PgProductStore`]: product catalog reads (stock as JSONB)
//! - [`PgCartStore`]: cart documents with a transactional stock re-check on
//!   quantity-raising writes
//!
//! The coupon index and the cart write guard close the read-then-write
//! races the domain layer cannot close on its own; their violations map to
//! [`StoreError::Conflict`] so callers can translate them into the matching
//! business rejections.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use storefront_core::stores::StoreError;

mod carts;
mod coupons;
mod orders;
mod products;

pub use carts::PgCartStore;
pub use coupons::PgCouponStore;
pub use orders::PgOrderHistoryStore;
pub use products::PgProductStore;

/// Maps a sqlx failure to the domain's infrastructure error, logging it.
pub(crate) fn db_error(context: &str, error: &sqlx::Error) -> StoreError {
    tracing::error!(%error, context, "postgres operation failed");
    StoreError::Unavailable(format!("{context}: {error}"))
}

/// Maps a JSON decode failure of stored state to a serialization error.
pub(crate) fn decode_error(context: &str, error: &serde_json::Error) -> StoreError {
    tracing::error!(%error, context, "stored document failed to decode");
    StoreError::Serialization(format!("{context}: {error}"))
}

/// Opens a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] when the database cannot be reached.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(|e| db_error("connect", &e))
}

/// Name of the partial index enforcing one active program coupon per
/// customer; [`PgCouponStore`] matches conflicts against it.
pub(crate) const ONE_ACTIVE_COUPON_INDEX: &str = "coupons_one_active_program_per_customer";

/// Creates the tables and indexes this crate expects (idempotent).
///
/// `program_prefix` parameterizes the partial unique index predicate and
/// must be ASCII alphanumeric (it is interpolated into DDL).
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] on database failure or an invalid
/// prefix.
pub async fn ensure_schema(pool: &PgPool, program_prefix: &str) -> Result<(), StoreError> {
    if program_prefix.is_empty() || !program_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StoreError::Unavailable(format!(
            "program prefix {program_prefix:?} must be ASCII alphanumeric"
        )));
    }

    let statements = [
        "CREATE TABLE IF NOT EXISTS orders (
            id UUID PRIMARY KEY,
            customer_id UUID NOT NULL,
            total_amount_cents BIGINT NOT NULL,
            status TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS orders_customer_status_idx
            ON orders (customer_id, status)"
            .to_string(),
        "CREATE TABLE IF NOT EXISTS coupons (
            code TEXT PRIMARY KEY,
            customer_id UUID NOT NULL,
            discount_percent SMALLINT NOT NULL,
            minimum_amount_cents BIGINT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            is_active BOOLEAN NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS coupons_customer_created_idx
            ON coupons (customer_id, created_at DESC)"
            .to_string(),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {ONE_ACTIVE_COUPON_INDEX}
                ON coupons (customer_id)
                WHERE is_active AND code LIKE '{program_prefix}%'"
        ),
        "CREATE TABLE IF NOT EXISTS products (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            price_cents BIGINT NOT NULL,
            stock JSONB NOT NULL
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS carts (
            customer_id UUID PRIMARY KEY,
            lines JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )"
        .to_string(),
    ];

    for statement in statements {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| db_error("ensure schema", &e))?;
    }
    tracing::info!("postgres schema ensured");
    Ok(())
}

/// The full set of Storefront stores over one pool, ready for injection.
#[derive(Clone)]
pub struct PgStores {
    /// Order-history aggregation store
    pub orders: Arc<PgOrderHistoryStore>,
    /// Coupon store
    pub coupons: Arc<PgCouponStore>,
    /// Product catalog store
    pub products: Arc<PgProductStore>,
    /// Cart store
    pub carts: Arc<PgCartStore>,
}

impl PgStores {
    /// Bundles one store of each kind over a shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            orders: Arc::new(PgOrderHistoryStore::new(pool.clone())),
            coupons: Arc::new(PgCouponStore::new(pool.clone())),
            products: Arc::new(PgProductStore::new(pool.clone())),
            carts: Arc::new(PgCartStore::new(pool)),
        }
    }
}
