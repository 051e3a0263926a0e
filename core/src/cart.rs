//! Stock-aware cart maintenance.
//!
//! Keeps every cart line under the product's real-time available stock and
//! computes authoritative availability for a `(product, size)` pair. Stock
//! is checked at mutation time only; nothing is held or reserved, so two
//! concurrent mutations can both observe the same stale count. That is a
//! known limitation of this model; the PostgreSQL store layers a
//! conditional write guard on top.

use crate::environment::Clock;
use crate::stores::{CartStore, ProductStore, StoreError};
use crate::types::{Cart, CartLine, CartLineKey, CustomerId, Money, Product, ProductId};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Availability (pure)
// ============================================================================

/// Authoritative availability for a `(product, size)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    /// Units currently available (0 when sold out or size unknown)
    Units(u32),
    /// The product is sized and no size was given; availability cannot be
    /// determined until the customer selects one
    SizeRequired,
}

/// Computes available stock for a product and optional size.
///
/// Unsized products ignore `size`. Sized products require one: without it
/// the answer is [`Availability::SizeRequired`]; with it, sizes missing
/// from the stock map read as 0.
#[must_use]
pub fn available_stock(product: &Product, size: Option<&str>) -> Availability {
    product
        .stock
        .available_for(size)
        .map_or(Availability::SizeRequired, Availability::Units)
}

/// Validates a requested quantity against current stock.
///
/// On success returns the available count for user-facing messaging.
///
/// # Errors
///
/// [`CartError::SizeRequired`] when a sized product has no size selected,
/// [`CartError::InvalidQuantity`] when `requested` is zero, and
/// [`CartError::InsufficientStock`] when `requested` exceeds availability.
pub fn validate_stock(
    product: &Product,
    size: Option<&str>,
    requested: u32,
) -> Result<u32, CartError> {
    let available = match available_stock(product, size) {
        Availability::SizeRequired => return Err(CartError::SizeRequired),
        Availability::Units(units) => units,
    };
    if requested == 0 {
        return Err(CartError::InvalidQuantity);
    }
    if requested > available {
        return Err(CartError::InsufficientStock {
            requested,
            available,
            in_cart: 0,
        });
    }
    Ok(available)
}

// ============================================================================
// Errors
// ============================================================================

/// Client-correctable cart failures, plus the infrastructure passthrough.
///
/// Every variant carries the numbers a UI needs to explain the rejection.
#[derive(Debug, Error)]
pub enum CartError {
    /// The referenced product does not exist (or was deleted)
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A sized product was addressed without a size
    #[error("size selection required for this product")]
    SizeRequired,

    /// Quantity must be at least 1
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The requested quantity exceeds current stock
    #[error("only {available} available (requested {requested}, already in cart {in_cart})")]
    InsufficientStock {
        /// Quantity that was validated (combined with held units on merge)
        requested: u32,
        /// Units currently available
        available: u32,
        /// Units of this line already held in the cart
        in_cart: u32,
    },

    /// No cart line matches the given key
    #[error("cart line {0} not found")]
    LineNotFound(CartLineKey),

    /// Infrastructure failure from the underlying stores
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Views
// ============================================================================

/// One priced cart line as returned to callers.
#[derive(Clone, Debug, Serialize)]
pub struct CartLineView {
    /// Wire key addressing this line (`<uuid>` or `<uuid>-<size>`)
    pub key: String,
    /// Referenced product
    pub product_id: ProductId,
    /// Product display name
    pub name: String,
    /// Selected size, if any
    pub size: Option<String>,
    /// Units held
    pub quantity: u32,
    /// Unit price
    pub unit_price: Money,
    /// `unit_price * quantity`
    pub line_total: Money,
    /// Stock currently available for this product/size
    pub available: u32,
}

/// The customer's cart as returned to callers.
#[derive(Clone, Debug, Serialize)]
pub struct CartView {
    /// Owning customer
    pub customer_id: CustomerId,
    /// Priced line items
    pub lines: Vec<CartLineView>,
    /// Sum of line totals
    pub total: Money,
}

// ============================================================================
// Service
// ============================================================================

/// Cart mutation and read service.
#[derive(Clone)]
pub struct CartService {
    products: Arc<dyn ProductStore>,
    carts: Arc<dyn CartStore>,
    clock: Arc<dyn Clock>,
}

impl CartService {
    /// Creates a cart service over the given stores
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductStore>,
        carts: Arc<dyn CartStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            products,
            carts,
            clock,
        }
    }

    /// Reads the customer's cart.
    ///
    /// Runs the self-healing pass first: lines whose product reference is
    /// dangling or whose quantity is non-positive are purged and the
    /// repaired cart is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Store`] on infrastructure failure.
    pub async fn read_cart(&self, customer_id: CustomerId) -> Result<CartView, CartError> {
        let cart = self.load(customer_id).await?;
        self.heal_and_view(cart).await
    }

    /// Adds `quantity` units of a product (and size, for sized products).
    ///
    /// When a line for `(product, size)` already exists, the *combined*
    /// quantity is validated before merging; on failure the rejection
    /// reports both the available stock and the already-held units.
    ///
    /// # Errors
    ///
    /// [`CartError::ProductNotFound`], the validation failures of
    /// [`validate_stock`], or [`CartError::Store`].
    pub async fn add_to_cart(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        size: Option<String>,
        quantity: u32,
    ) -> Result<CartView, CartError> {
        let product = self.product(product_id).await?;
        let available = match available_stock(&product, size.as_deref()) {
            Availability::SizeRequired => return Err(CartError::SizeRequired),
            Availability::Units(units) => units,
        };
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut cart = self.load(customer_id).await?;
        let held = cart
            .line(product_id, size.as_deref())
            .map_or(0, |line| line.quantity);
        let combined = held.saturating_add(quantity);
        if combined > available {
            tracing::debug!(
                customer = %customer_id,
                product = %product_id,
                size = size.as_deref().unwrap_or("-"),
                requested = combined,
                available,
                "add to cart rejected: insufficient stock"
            );
            return Err(CartError::InsufficientStock {
                requested: combined,
                available,
                in_cart: held,
            });
        }

        if let Some(line) = cart.line_mut(product_id, size.as_deref()) {
            line.quantity = combined;
        } else {
            cart.lines.push(CartLine {
                product_id,
                size,
                quantity,
            });
        }
        cart.updated_at = self.clock.now();
        self.carts.put_cart(&cart).await?;
        self.heal_and_view(cart).await
    }

    /// Sets the quantity of an existing line, re-validating against
    /// *current* stock (which may have shrunk since the line was added).
    ///
    /// # Errors
    ///
    /// [`CartError::InvalidQuantity`] for zero, [`CartError::LineNotFound`]
    /// when no line matches, [`CartError::ProductNotFound`] when the
    /// product vanished, stock validation failures, or [`CartError::Store`].
    pub async fn update_quantity(
        &self,
        customer_id: CustomerId,
        key: &CartLineKey,
        quantity: u32,
    ) -> Result<CartView, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut cart = self.load(customer_id).await?;
        if cart.line(key.product_id, key.size.as_deref()).is_none() {
            return Err(CartError::LineNotFound(key.clone()));
        }

        let product = self.product(key.product_id).await?;
        validate_stock(&product, key.size.as_deref(), quantity)?;

        if let Some(line) = cart.line_mut(key.product_id, key.size.as_deref()) {
            line.quantity = quantity;
        }
        cart.updated_at = self.clock.now();
        self.carts.put_cart(&cart).await?;
        self.heal_and_view(cart).await
    }

    /// Removes one line, or clears the whole cart when `key` is `None`.
    ///
    /// Removing a line that does not exist is a success (idempotent
    /// deletion).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Store`] on infrastructure failure.
    pub async fn remove_line(
        &self,
        customer_id: CustomerId,
        key: Option<&CartLineKey>,
    ) -> Result<CartView, CartError> {
        let Some(key) = key else {
            self.carts.delete_cart(&customer_id).await?;
            tracing::debug!(customer = %customer_id, "cart cleared");
            let now = self.clock.now();
            return self.heal_and_view(Cart::empty(customer_id, now)).await;
        };

        let mut cart = self.load(customer_id).await?;
        let before = cart.lines.len();
        cart.lines
            .retain(|line| !line.matches(key.product_id, key.size.as_deref()));
        if cart.lines.len() != before {
            cart.updated_at = self.clock.now();
            self.carts.put_cart(&cart).await?;
        }
        self.heal_and_view(cart).await
    }

    /// Loads the cart, defaulting to an empty one.
    async fn load(&self, customer_id: CustomerId) -> Result<Cart, CartError> {
        Ok(self
            .carts
            .cart(&customer_id)
            .await?
            .unwrap_or_else(|| Cart::empty(customer_id, self.clock.now())))
    }

    /// Fetches a product, mapping absence to [`CartError::ProductNotFound`].
    async fn product(&self, id: ProductId) -> Result<Product, CartError> {
        self.products
            .product(&id)
            .await?
            .ok_or(CartError::ProductNotFound(id))
    }

    /// Drops dangling or zero-quantity lines, persists the repaired cart if
    /// anything was dropped, and prices the remainder.
    async fn heal_and_view(&self, mut cart: Cart) -> Result<CartView, CartError> {
        let mut views = Vec::with_capacity(cart.lines.len());
        let mut healthy = Vec::with_capacity(cart.lines.len());
        let mut total = Money::ZERO;
        let mut purged = 0_u32;

        for line in cart.lines {
            if line.quantity == 0 {
                purged += 1;
                continue;
            }
            let Some(product) = self.products.product(&line.product_id).await? else {
                purged += 1;
                continue;
            };

            let available = match available_stock(&product, line.size.as_deref()) {
                Availability::Units(units) => units,
                Availability::SizeRequired => 0,
            };
            let line_total = product
                .price
                .checked_multiply(line.quantity)
                .unwrap_or(Money::ZERO);
            total = total.saturating_add(line_total);
            views.push(CartLineView {
                key: line.key().to_string(),
                product_id: line.product_id,
                name: product.name.clone(),
                size: line.size.clone(),
                quantity: line.quantity,
                unit_price: product.price,
                line_total,
                available,
            });
            healthy.push(line);
        }

        if purged > 0 {
            tracing::debug!(
                customer = %cart.customer_id,
                purged,
                "purged dangling cart lines"
            );
            cart.lines = healthy;
            cart.updated_at = self.clock.now();
            self.carts.put_cart(&cart).await?;
        }

        Ok(CartView {
            customer_id: cart.customer_id,
            lines: views,
            total,
        })
    }
}
