//! Domain types for Storefront.
//!
//! This module contains the value objects and entities shared by the VIP
//! eligibility engine and the stock-aware cart: identifiers, money, spending
//! aggregates, coupons, products, and cart lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a customer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Creates a new random `CustomerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `CustomerId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Creates a new random `ProductId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ProductId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A coupon code such as `VIP4X7QZ2`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CouponCode(String);

impl CouponCode {
    /// Creates a `CouponCode` from a string
    #[must_use]
    pub const fn new(code: String) -> Self {
        Self(code)
    }

    /// The code as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this code carries the given program prefix (e.g. `"VIP"`)
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero dollars
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from dollars
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (dollars * 100 > `u64::MAX`).
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_dollars(dollars: u64) -> Self {
        match dollars.checked_mul(100) {
            Some(cents) => Self(cents),
            None => panic!("Money::from_dollars overflow"),
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in dollars (rounded down)
    #[must_use]
    pub const fn dollars(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts, saturating at `u64::MAX` cents
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Divides evenly across `count` units (rounded down); `None` when `count == 0`
    #[must_use]
    pub const fn checked_div(self, count: u32) -> Option<Self> {
        if count == 0 {
            None
        } else {
            Some(Self(self.0 / count as u64))
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Spending Profile (derived aggregate)
// ============================================================================

/// A customer's spending aggregate, derived from completed order history.
///
/// Not stored: the order-history store computes this on demand by summing
/// `total_amount` and counting completed orders per customer. The average is
/// derived in the constructor so `avg_order_value == total_spent / order_count`
/// holds by construction whenever `order_count > 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingProfile {
    /// Customer this aggregate belongs to
    pub customer_id: CustomerId,
    /// Sum of all completed order totals
    pub total_spent: Money,
    /// Number of completed orders
    pub order_count: u32,
    /// Average order value (`total_spent / order_count`, zero when no orders)
    pub avg_order_value: Money,
    /// Timestamp of the first completed order, if any
    pub first_order_at: Option<DateTime<Utc>>,
    /// Timestamp of the most recent completed order, if any
    pub last_order_at: Option<DateTime<Utc>>,
}

impl SpendingProfile {
    /// Creates a `SpendingProfile`, deriving the average order value
    #[must_use]
    pub fn new(
        customer_id: CustomerId,
        total_spent: Money,
        order_count: u32,
        first_order_at: Option<DateTime<Utc>>,
        last_order_at: Option<DateTime<Utc>>,
    ) -> Self {
        let avg_order_value = total_spent.checked_div(order_count).unwrap_or(Money::ZERO);
        Self {
            customer_id,
            total_spent,
            order_count,
            avg_order_value,
            first_order_at,
            last_order_at,
        }
    }

    /// An empty profile for a customer with no completed orders
    #[must_use]
    pub fn empty(customer_id: CustomerId) -> Self {
        Self::new(customer_id, Money::ZERO, 0, None, None)
    }
}

// ============================================================================
// Coupon
// ============================================================================

/// A discount coupon owned by exactly one customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Unique coupon code
    pub code: CouponCode,
    /// Discount percentage (0..=60)
    pub discount_percent: u8,
    /// Minimum order amount required to redeem
    pub minimum_amount: Money,
    /// When the coupon expires
    pub expires_at: DateTime<Utc>,
    /// Whether the coupon is still active (cleared on expiry or redemption)
    pub is_active: bool,
    /// Owning customer
    pub customer_id: CustomerId,
    /// When the coupon was issued
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Whether the coupon can still be redeemed at `now`.
    ///
    /// Expiry is evaluated here rather than trusted from `is_active`, because
    /// deactivation of expired coupons happens lazily.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }

    /// Whether the coupon is flagged active but past its expiration
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at <= now
    }
}

// ============================================================================
// Product and Stock
// ============================================================================

/// Per-product inventory: a single count, or one count per size label.
///
/// Every size a product declares has an entry here; a size with no entry
/// reads as zero available.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStock {
    /// Product without size variants
    Unsized(u32),
    /// Product with per-size inventory, keyed by size label (e.g. `"M"`)
    Sized(HashMap<String, u32>),
}

impl ProductStock {
    /// Whether this product requires a size selection
    #[must_use]
    pub const fn is_sized(&self) -> bool {
        matches!(self, Self::Sized(_))
    }

    /// Units available for an optional size selection.
    ///
    /// Returns `None` when the product is sized and no size was given
    /// (availability cannot be determined); sizes missing from the map read
    /// as 0.
    #[must_use]
    pub fn available_for(&self, size: Option<&str>) -> Option<u32> {
        match self {
            Self::Unsized(units) => Some(*units),
            Self::Sized(by_size) => {
                size.map(|label| by_size.get(label).copied().unwrap_or(0))
            }
        }
    }

    /// Total units across all sizes
    #[must_use]
    pub fn total_units(&self) -> u64 {
        match self {
            Self::Unsized(units) => u64::from(*units),
            Self::Sized(by_size) => by_size.values().map(|u| u64::from(*u)).sum(),
        }
    }
}

/// A sellable product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Inventory counts
    pub stock: ProductStock,
}

// ============================================================================
// Cart
// ============================================================================

/// One line in a customer's cart.
///
/// Uniqueness key is `(product_id, size)`: the same product in two sizes is
/// two distinct lines. Invariant after every mutation: `quantity >= 1` and
/// `quantity` does not exceed the stock available at mutation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Referenced product
    pub product_id: ProductId,
    /// Selected size, if the product is sized
    pub size: Option<String>,
    /// Units of this product/size held in the cart
    pub quantity: u32,
}

impl CartLine {
    /// The composite key identifying this line
    #[must_use]
    pub fn key(&self) -> CartLineKey {
        CartLineKey {
            product_id: self.product_id,
            size: self.size.clone(),
        }
    }

    /// Whether this line matches a `(product, size)` pair
    #[must_use]
    pub fn matches(&self, product_id: ProductId, size: Option<&str>) -> bool {
        self.product_id == product_id && self.size.as_deref() == size
    }
}

/// A customer's cart: owned, embedded line items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Owning customer
    pub customer_id: CustomerId,
    /// Line items, unique by `(product_id, size)`
    pub lines: Vec<CartLine>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a customer
    #[must_use]
    pub const fn empty(customer_id: CustomerId, now: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            lines: Vec::new(),
            updated_at: now,
        }
    }

    /// Finds a line by `(product, size)`
    #[must_use]
    pub fn line(&self, product_id: ProductId, size: Option<&str>) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(product_id, size))
    }

    /// Finds a line mutably by `(product, size)`
    pub fn line_mut(&mut self, product_id: ProductId, size: Option<&str>) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.matches(product_id, size))
    }
}

// ============================================================================
// Cart Line Key
// ============================================================================

/// Wire encoding of a cart line identity: `<product-uuid>` for unsized lines,
/// `<product-uuid>-<size>` for sized ones.
///
/// UUIDs render at a fixed 36 characters, so the size suffix is recovered
/// positionally; size labels containing `-` round-trip intact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartLineKey {
    /// Referenced product
    pub product_id: ProductId,
    /// Size component, if present
    pub size: Option<String>,
}

/// Canonical length of a hyphenated UUID string
const UUID_LEN: usize = 36;

impl CartLineKey {
    /// Creates a key from its parts
    #[must_use]
    pub const fn new(product_id: ProductId, size: Option<String>) -> Self {
        Self { product_id, size }
    }

    /// Parses a key of the form `<uuid>` or `<uuid>-<size>`.
    ///
    /// Returns `None` when the leading 36 characters are not a valid UUID or
    /// the size delimiter/label is malformed (e.g. a trailing bare `-`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() < UUID_LEN || !raw.is_char_boundary(UUID_LEN) {
            return None;
        }
        let (id_part, rest) = raw.split_at(UUID_LEN);
        let product_id = ProductId::from_uuid(Uuid::parse_str(id_part).ok()?);
        let size = match rest.strip_prefix('-') {
            Some("") => return None,
            Some(size) => Some(size.to_string()),
            None if rest.is_empty() => None,
            None => return None,
        };
        Some(Self { product_id, size })
    }
}

impl fmt::Display for CartLineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.size {
            Some(size) => write!(f, "{}-{size}", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}
