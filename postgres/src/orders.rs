//! Spending aggregation over the completed-order history.

use crate::db_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use storefront_core::stores::{OrderHistoryStore, StoreError};
use storefront_core::types::{CustomerId, Money, SpendingProfile};
use uuid::Uuid;

/// Order status value that counts toward the spending aggregate
const COMPLETED: &str = "completed";

/// `PostgreSQL`-backed order-history aggregation.
///
/// The spending aggregate is derived, never stored: every lookup runs the
/// SUM/COUNT/MIN/MAX aggregation so the numbers reflect the order table as
/// of the query.
#[derive(Clone)]
pub struct PgOrderHistoryStore {
    pool: PgPool,
}

impl PgOrderHistoryStore {
    /// Creates a store over the given pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Totals and counts are non-negative in our domain
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn profile_from_row(
    customer: CustomerId,
    total_cents: i64,
    order_count: i64,
    first_order_at: Option<DateTime<Utc>>,
    last_order_at: Option<DateTime<Utc>>,
) -> SpendingProfile {
    SpendingProfile::new(
        customer,
        Money::from_cents(total_cents.max(0) as u64),
        order_count.max(0) as u32,
        first_order_at,
        last_order_at,
    )
}

#[async_trait]
impl OrderHistoryStore for PgOrderHistoryStore {
    async fn spending_profile(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<SpendingProfile>, StoreError> {
        let row: (i64, i64, Option<DateTime<Utc>>, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount_cents), 0)::BIGINT,
                    COUNT(*)::BIGINT,
                    MIN(created_at),
                    MAX(created_at)
             FROM orders
             WHERE customer_id = $1 AND status = $2",
        )
        .bind(customer.as_uuid())
        .bind(COMPLETED)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("aggregate customer orders", &e))?;

        let (total_cents, order_count, first_order_at, last_order_at) = row;
        if order_count == 0 {
            return Ok(None);
        }
        Ok(Some(profile_from_row(
            *customer,
            total_cents,
            order_count,
            first_order_at,
            last_order_at,
        )))
    }

    async fn all_spending_profiles(&self) -> Result<Vec<SpendingProfile>, StoreError> {
        let rows: Vec<(Uuid, i64, i64, Option<DateTime<Utc>>, Option<DateTime<Utc>>)> =
            sqlx::query_as(
                "SELECT customer_id,
                        COALESCE(SUM(total_amount_cents), 0)::BIGINT,
                        COUNT(*)::BIGINT,
                        MIN(created_at),
                        MAX(created_at)
                 FROM orders
                 WHERE status = $1
                 GROUP BY customer_id
                 ORDER BY customer_id",
            )
            .bind(COMPLETED)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("aggregate all orders", &e))?;

        Ok(rows
            .into_iter()
            .map(|(customer, total, count, first, last)| {
                profile_from_row(CustomerId::from_uuid(customer), total, count, first, last)
            })
            .collect())
    }
}
