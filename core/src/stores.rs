//! Persistence traits consumed by the domain services.
//!
//! The engine and cart service talk to the outside world exclusively through
//! these object-safe traits, injected as `Arc<dyn …>`. Production backs them
//! with PostgreSQL (`storefront-postgres`); tests use the in-memory stores
//! from `storefront-testing`.

use crate::types::{Cart, Coupon, CouponCode, CustomerId, Product, ProductId, SpendingProfile};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Which datastore constraint rejected a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    /// The coupon code is already taken (regenerate and retry)
    CouponCode,
    /// The customer already holds an active program coupon
    ActiveCoupon,
    /// A cart write raced a stock change and would exceed availability
    StockCeiling,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CouponCode => write!(f, "coupon code"),
            Self::ActiveCoupon => write!(f, "active coupon per customer"),
            Self::StockCeiling => write!(f, "stock ceiling"),
        }
    }
}

/// Infrastructure failures surfaced by store implementations.
///
/// Business-rule outcomes never appear here: an ineligible customer or an
/// out-of-stock product is a reported value, not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The datastore could not be reached or the query failed
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write
    #[error("uniqueness conflict on {0}")]
    Conflict(ConflictKind),

    /// Stored data could not be decoded into domain types
    #[error("stored data could not be decoded: {0}")]
    Serialization(String),
}

// ============================================================================
// Order history
// ============================================================================

/// Read access to completed-order aggregates.
#[async_trait]
pub trait OrderHistoryStore: Send + Sync {
    /// The spending aggregate for one customer; `None` when the customer has
    /// no completed orders.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn spending_profile(
        &self,
        customer: &CustomerId,
    ) -> Result<Option<SpendingProfile>, StoreError>;

    /// Spending aggregates for every customer with at least one completed
    /// order. Used by the administrative batch evaluation.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn all_spending_profiles(&self) -> Result<Vec<SpendingProfile>, StoreError>;
}

// ============================================================================
// Coupons
// ============================================================================

/// Coupon persistence.
///
/// Implementations must enforce code uniqueness at write time and should
/// enforce "one active program coupon per customer" (a partial unique index
/// in PostgreSQL); both violations surface as [`StoreError::Conflict`].
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// The customer's active coupon with the given code prefix, if any.
    ///
    /// "Active" means the stored flag; expiry is the caller's concern
    /// (deactivation is lazy).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn active_coupon_with_prefix(
        &self,
        customer: &CustomerId,
        prefix: &str,
    ) -> Result<Option<Coupon>, StoreError>;

    /// The customer's most recently created coupon with the given prefix,
    /// active or not. Drives the issuance cooldown.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn latest_coupon_with_prefix(
        &self,
        customer: &CustomerId,
        prefix: &str,
    ) -> Result<Option<Coupon>, StoreError>;

    /// Persists a new coupon.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the code or the
    /// one-active-per-customer constraint rejects the write, and
    /// `StoreError::Unavailable` on infrastructure failure.
    async fn insert(&self, coupon: &Coupon) -> Result<(), StoreError>;

    /// Clears the active flag on a coupon (lazy expiry, redemption).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn deactivate(
        &self,
        customer: &CustomerId,
        code: &CouponCode,
    ) -> Result<(), StoreError>;
}

// ============================================================================
// Products
// ============================================================================

/// Read access to the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetch a product by id; `None` when it does not exist (or was deleted).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;
}

// ============================================================================
// Carts
// ============================================================================

/// Cart persistence, one document per customer.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The customer's cart; `None` when they have never added anything.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn cart(&self, customer: &CustomerId) -> Result<Option<Cart>, StoreError>;

    /// Writes the full cart document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn put_cart(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Removes the customer's cart entirely.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the datastore is unreachable.
    async fn delete_cart(&self, customer: &CustomerId) -> Result<(), StoreError>;
}
