//! # Storefront Testing
//!
//! Testing utilities for the Storefront domain crates:
//!
//! - Deterministic mock implementations of the environment traits
//!   (fixed clock, fixed selection, sequential coupon codes)
//! - In-memory implementations of the store traits, including the
//!   uniqueness constraints the PostgreSQL layer enforces
//! - Fixture builders for profiles, products, and coupons
//!
//! ## Example
//!
//! ```ignore
//! use storefront_testing::mocks::*;
//! use storefront_testing::helpers::profile;
//!
//! let orders = InMemoryOrderHistory::new();
//! orders.put_profile(profile(customer_id, 2_500, 10));
//! let engine = EligibilityEngine::new(
//!     Arc::new(orders),
//!     Arc::new(InMemoryCoupons::new()),
//!     Arc::new(test_clock()),
//!     Arc::new(FixedSelection(true)),
//!     Arc::new(SequentialCodes::new()),
//!     VipPolicy::default(),
//! );
//! ```

/// Mock implementations for deterministic tests.
pub mod mocks {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use storefront_core::environment::{Clock, CodeGenerator, SelectionPolicy};
    use storefront_core::stores::{
        CartStore, ConflictKind, CouponStore, OrderHistoryStore, ProductStore, StoreError,
    };
    use storefront_core::types::{
        Cart, Coupon, CouponCode, CustomerId, Product, ProductId, SpendingProfile,
    };

    fn poisoned() -> StoreError {
        StoreError::Unavailable("mock lock poisoned".to_string())
    }

    // ========================================================================
    // Clock
    // ========================================================================

    /// Fixed clock for deterministic tests: always returns the same time.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-06-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which should never
    /// happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    // ========================================================================
    // Selection and codes
    // ========================================================================

    /// Selection policy with a single fixed answer for every customer.
    #[derive(Debug, Clone, Copy)]
    pub struct FixedSelection(pub bool);

    impl SelectionPolicy for FixedSelection {
        fn selects(&self, _customer: &CustomerId, _now: DateTime<Utc>) -> bool {
            self.0
        }
    }

    /// Selection policy admitting exactly the listed customers.
    #[derive(Debug, Clone, Default)]
    pub struct SelectSet {
        admitted: HashSet<CustomerId>,
    }

    impl SelectSet {
        /// Creates a policy admitting the given customers
        #[must_use]
        pub fn admitting<I: IntoIterator<Item = CustomerId>>(customers: I) -> Self {
            Self {
                admitted: customers.into_iter().collect(),
            }
        }
    }

    impl SelectionPolicy for SelectSet {
        fn selects(&self, customer: &CustomerId, _now: DateTime<Utc>) -> bool {
            self.admitted.contains(customer)
        }
    }

    /// Predictable coupon codes: `<prefix>000001`, `<prefix>000002`, …
    #[derive(Debug, Default)]
    pub struct SequentialCodes {
        counter: AtomicU64,
    }

    impl SequentialCodes {
        /// Creates a generator starting at 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                counter: AtomicU64::new(0),
            }
        }
    }

    impl CodeGenerator for SequentialCodes {
        fn coupon_code(&self, prefix: &str, suffix_len: usize) -> CouponCode {
            let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
            CouponCode::new(format!("{prefix}{n:0suffix_len$}"))
        }
    }

    // ========================================================================
    // Order history
    // ========================================================================

    /// In-memory order-history aggregates, seeded directly with profiles.
    #[derive(Debug, Default)]
    pub struct InMemoryOrderHistory {
        profiles: Mutex<Vec<SpendingProfile>>,
    }

    impl InMemoryOrderHistory {
        /// Creates an empty store
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds (or replaces) a customer's aggregate
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[allow(clippy::expect_used)]
        pub fn put_profile(&self, profile: SpendingProfile) {
            let mut profiles = self.profiles.lock().expect("mock lock poisoned");
            profiles.retain(|p| p.customer_id != profile.customer_id);
            profiles.push(profile);
        }
    }

    #[async_trait]
    impl OrderHistoryStore for InMemoryOrderHistory {
        async fn spending_profile(
            &self,
            customer: &CustomerId,
        ) -> Result<Option<SpendingProfile>, StoreError> {
            let profiles = self.profiles.lock().map_err(|_| poisoned())?;
            Ok(profiles.iter().find(|p| p.customer_id == *customer).cloned())
        }

        async fn all_spending_profiles(&self) -> Result<Vec<SpendingProfile>, StoreError> {
            let profiles = self.profiles.lock().map_err(|_| poisoned())?;
            Ok(profiles.clone())
        }
    }

    // ========================================================================
    // Coupons
    // ========================================================================

    /// In-memory coupon store enforcing the same constraints as the
    /// PostgreSQL layer: unique codes, and at most one active coupon with
    /// the program prefix per customer.
    #[derive(Debug)]
    pub struct InMemoryCoupons {
        coupons: Mutex<Vec<Coupon>>,
        program_prefix: String,
    }

    impl Default for InMemoryCoupons {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InMemoryCoupons {
        /// Creates a store enforcing the `"VIP"` program prefix
        #[must_use]
        pub fn new() -> Self {
            Self::with_prefix("VIP")
        }

        /// Creates a store enforcing a custom program prefix
        #[must_use]
        pub fn with_prefix(prefix: &str) -> Self {
            Self {
                coupons: Mutex::new(Vec::new()),
                program_prefix: prefix.to_string(),
            }
        }

        /// Snapshot of every stored coupon, in insertion order
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn all(&self) -> Vec<Coupon> {
            self.coupons.lock().expect("mock lock poisoned").clone()
        }
    }

    #[async_trait]
    impl CouponStore for InMemoryCoupons {
        async fn active_coupon_with_prefix(
            &self,
            customer: &CustomerId,
            prefix: &str,
        ) -> Result<Option<Coupon>, StoreError> {
            let coupons = self.coupons.lock().map_err(|_| poisoned())?;
            Ok(coupons
                .iter()
                .find(|c| c.customer_id == *customer && c.is_active && c.code.has_prefix(prefix))
                .cloned())
        }

        async fn latest_coupon_with_prefix(
            &self,
            customer: &CustomerId,
            prefix: &str,
        ) -> Result<Option<Coupon>, StoreError> {
            let coupons = self.coupons.lock().map_err(|_| poisoned())?;
            Ok(coupons
                .iter()
                .filter(|c| c.customer_id == *customer && c.code.has_prefix(prefix))
                .max_by_key(|c| c.created_at)
                .cloned())
        }

        async fn insert(&self, coupon: &Coupon) -> Result<(), StoreError> {
            let mut coupons = self.coupons.lock().map_err(|_| poisoned())?;
            if coupons.iter().any(|c| c.code == coupon.code) {
                return Err(StoreError::Conflict(ConflictKind::CouponCode));
            }
            let violates_single_active = coupon.is_active
                && coupon.code.has_prefix(&self.program_prefix)
                && coupons.iter().any(|c| {
                    c.customer_id == coupon.customer_id
                        && c.is_active
                        && c.code.has_prefix(&self.program_prefix)
                });
            if violates_single_active {
                return Err(StoreError::Conflict(ConflictKind::ActiveCoupon));
            }
            coupons.push(coupon.clone());
            Ok(())
        }

        async fn deactivate(
            &self,
            customer: &CustomerId,
            code: &CouponCode,
        ) -> Result<(), StoreError> {
            let mut coupons = self.coupons.lock().map_err(|_| poisoned())?;
            for coupon in coupons
                .iter_mut()
                .filter(|c| c.customer_id == *customer && c.code == *code)
            {
                coupon.is_active = false;
            }
            Ok(())
        }
    }

    // ========================================================================
    // Products
    // ========================================================================

    /// In-memory product catalog.
    #[derive(Debug, Default)]
    pub struct InMemoryProducts {
        products: Mutex<HashMap<ProductId, Product>>,
    }

    impl InMemoryProducts {
        /// Creates an empty catalog
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds or replaces a product
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[allow(clippy::expect_used)]
        pub fn put(&self, product: Product) {
            self.products
                .lock()
                .expect("mock lock poisoned")
                .insert(product.id, product);
        }

        /// Deletes a product (to simulate dangling cart references)
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[allow(clippy::expect_used)]
        pub fn delete(&self, id: &ProductId) {
            self.products.lock().expect("mock lock poisoned").remove(id);
        }
    }

    #[async_trait]
    impl ProductStore for InMemoryProducts {
        async fn product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
            let products = self.products.lock().map_err(|_| poisoned())?;
            Ok(products.get(id).cloned())
        }
    }

    // ========================================================================
    // Carts
    // ========================================================================

    /// In-memory cart documents, one per customer.
    #[derive(Debug, Default)]
    pub struct InMemoryCarts {
        carts: Mutex<HashMap<CustomerId, Cart>>,
    }

    impl InMemoryCarts {
        /// Creates an empty store
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Raw stored cart for assertions (bypasses the self-healing read)
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn raw(&self, customer: &CustomerId) -> Option<Cart> {
            self.carts
                .lock()
                .expect("mock lock poisoned")
                .get(customer)
                .cloned()
        }

        /// Seeds a cart document directly (bypasses validation)
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[allow(clippy::expect_used)]
        pub fn seed(&self, cart: Cart) {
            self.carts
                .lock()
                .expect("mock lock poisoned")
                .insert(cart.customer_id, cart);
        }
    }

    #[async_trait]
    impl CartStore for InMemoryCarts {
        async fn cart(&self, customer: &CustomerId) -> Result<Option<Cart>, StoreError> {
            let carts = self.carts.lock().map_err(|_| poisoned())?;
            Ok(carts.get(customer).cloned())
        }

        async fn put_cart(&self, cart: &Cart) -> Result<(), StoreError> {
            let mut carts = self.carts.lock().map_err(|_| poisoned())?;
            carts.insert(cart.customer_id, cart.clone());
            Ok(())
        }

        async fn delete_cart(&self, customer: &CustomerId) -> Result<(), StoreError> {
            let mut carts = self.carts.lock().map_err(|_| poisoned())?;
            carts.remove(customer);
            Ok(())
        }
    }
}

/// Fixture builders and test helpers.
pub mod helpers {
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use storefront_core::types::{
        Coupon, CouponCode, CustomerId, Money, Product, ProductId, ProductStock, SpendingProfile,
    };

    /// Initializes a compact tracing subscriber for test output; safe to
    /// call from every test (only the first call wins).
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }

    /// A spending profile with the average derived from total and count
    #[must_use]
    pub fn profile(customer_id: CustomerId, total_dollars: u64, orders: u32) -> SpendingProfile {
        SpendingProfile::new(
            customer_id,
            Money::from_dollars(total_dollars),
            orders,
            None,
            None,
        )
    }

    /// A product without size variants
    #[must_use]
    pub fn unsized_product(name: &str, price_dollars: u64, units: u32) -> Product {
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            price: Money::from_dollars(price_dollars),
            stock: ProductStock::Unsized(units),
        }
    }

    /// A product with per-size inventory
    #[must_use]
    pub fn sized_product(name: &str, price_dollars: u64, sizes: &[(&str, u32)]) -> Product {
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            price: Money::from_dollars(price_dollars),
            stock: ProductStock::Sized(
                sizes
                    .iter()
                    .map(|(label, units)| ((*label).to_string(), *units))
                    .collect::<HashMap<_, _>>(),
            ),
        }
    }

    /// A program coupon created at `created_at` and valid for `validity_days`
    #[must_use]
    pub fn vip_coupon(
        customer_id: CustomerId,
        code: &str,
        created_at: DateTime<Utc>,
        validity_days: i64,
        is_active: bool,
    ) -> Coupon {
        Coupon {
            code: CouponCode::new(code.to_string()),
            discount_percent: 25,
            minimum_amount: Money::from_dollars(200),
            expires_at: created_at + Duration::days(validity_days),
            is_active,
            customer_id,
            created_at,
        }
    }
}

// Re-export commonly used items
pub use helpers::init_tracing;
pub use mocks::{test_clock, FixedClock, FixedSelection};

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::environment::Clock;

    #[test]
    fn fixed_clock_is_stable() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }
}
