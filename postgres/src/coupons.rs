//! Coupon persistence with datastore-enforced uniqueness.
//!
//! Two constraints back the engine's guarantees: the `code` primary key
//! (collision → regenerate and retry) and the partial unique index allowing
//! at most one active program coupon per customer (violation → the claim
//! lost a race and resolves to "already has coupon").

use crate::{db_error, ONE_ACTIVE_COUPON_INDEX};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use storefront_core::stores::{ConflictKind, CouponStore, StoreError};
use storefront_core::types::{Coupon, CouponCode, CustomerId, Money};
use uuid::Uuid;

type CouponRow = (String, Uuid, i16, i64, DateTime<Utc>, bool, DateTime<Utc>);

const COUPON_COLUMNS: &str =
    "code, customer_id, discount_percent, minimum_amount_cents, expires_at, is_active, created_at";

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)] // Stored values fit the domain ranges
fn coupon_from_row(row: CouponRow) -> Coupon {
    let (code, customer_id, discount, minimum_cents, expires_at, is_active, created_at) = row;
    Coupon {
        code: CouponCode::new(code),
        discount_percent: discount.max(0) as u8,
        minimum_amount: Money::from_cents(minimum_cents.max(0) as u64),
        expires_at,
        is_active,
        customer_id: CustomerId::from_uuid(customer_id),
        created_at,
    }
}

/// `PostgreSQL`-backed coupon store.
///
/// The active-coupon uniqueness predicate lives in the schema (see
/// `ensure_schema`), so the store itself is prefix-agnostic: callers pass
/// the prefix they are interested in per query.
#[derive(Clone)]
pub struct PgCouponStore {
    pool: PgPool,
}

impl PgCouponStore {
    /// Creates a store over the given pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponStore for PgCouponStore {
    async fn active_coupon_with_prefix(
        &self,
        customer: &CustomerId,
        prefix: &str,
    ) -> Result<Option<Coupon>, StoreError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {COUPON_COLUMNS}
             FROM coupons
             WHERE customer_id = $1 AND is_active AND code LIKE $2 || '%'
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(customer.as_uuid())
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find active coupon", &e))?;

        Ok(row.map(coupon_from_row))
    }

    async fn latest_coupon_with_prefix(
        &self,
        customer: &CustomerId,
        prefix: &str,
    ) -> Result<Option<Coupon>, StoreError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {COUPON_COLUMNS}
             FROM coupons
             WHERE customer_id = $1 AND code LIKE $2 || '%'
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(customer.as_uuid())
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find latest coupon", &e))?;

        Ok(row.map(coupon_from_row))
    }

    async fn insert(&self, coupon: &Coupon) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO coupons
                 (code, customer_id, discount_percent, minimum_amount_cents,
                  expires_at, is_active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(coupon.code.as_str())
        .bind(coupon.customer_id.as_uuid())
        .bind(i16::from(coupon.discount_percent))
        .bind(i64::try_from(coupon.minimum_amount.cents()).unwrap_or(i64::MAX))
        .bind(coupon.expires_at)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                if let Some(db_err) = error.as_database_error() {
                    if db_err.is_unique_violation() {
                        let kind = if db_err.constraint() == Some(ONE_ACTIVE_COUPON_INDEX) {
                            ConflictKind::ActiveCoupon
                        } else {
                            ConflictKind::CouponCode
                        };
                        tracing::debug!(
                            code = coupon.code.as_str(),
                            customer = %coupon.customer_id,
                            %kind,
                            "coupon insert rejected by constraint"
                        );
                        return Err(StoreError::Conflict(kind));
                    }
                }
                Err(db_error("insert coupon", &error))
            }
        }
    }

    async fn deactivate(
        &self,
        customer: &CustomerId,
        code: &CouponCode,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE coupons SET is_active = FALSE WHERE customer_id = $1 AND code = $2")
            .bind(customer.as_uuid())
            .bind(code.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("deactivate coupon", &e))?;
        Ok(())
    }
}
