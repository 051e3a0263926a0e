//! # Storefront Core
//!
//! Domain core for the Storefront service: the VIP coupon eligibility
//! engine and the stock-aware cart.
//!
//! ## Subsystems
//!
//! - **Eligibility engine** ([`eligibility`]): classifies customers into
//!   VIP tiers from their spending aggregate, applies the issuance gates
//!   (active coupon, cooldown, qualification, program-size selection), and
//!   issues tiered coupons.
//! - **Cart** ([`cart`]): maintains cart lines such that quantity never
//!   exceeds real-time available stock, with a self-healing purge on read.
//!
//! ## Architecture
//!
//! - Business rules are pure functions over owned domain values
//! - Side effects sit behind injected traits ([`stores`], [`environment`])
//! - Business-rule rejections are reported values; `Err` means
//!   infrastructure failure
//!
//! ## Example
//!
//! ```ignore
//! use storefront_core::prelude::*;
//!
//! let engine = EligibilityEngine::new(orders, coupons, clock, selection, codes, VipPolicy::default());
//! match engine.claim(customer_id).await? {
//!     ClaimOutcome::Issued { coupon } => println!("issued {}", coupon.code),
//!     ClaimOutcome::Rejected { reason, .. } => println!("rejected: {reason}"),
//! }
//! ```

pub mod cart;
pub mod eligibility;
pub mod environment;
pub mod policy;
pub mod stores;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Convenience re-exports of the crate's main surface.
pub mod prelude {
    pub use crate::cart::{
        available_stock, validate_stock, Availability, CartError, CartLineView, CartService,
        CartView,
    };
    pub use crate::eligibility::{
        classify, qualification_path, BatchDetail, BatchOutcome, BatchSummary, ClaimOutcome,
        EligibilityEngine, EligibilityReport, QualificationPath, RejectionReason, TierBenefits,
        VipTier,
    };
    pub use crate::environment::{
        Clock, CodeGenerator, RandomCodes, SelectionPolicy, StableSampling, SystemClock,
    };
    pub use crate::policy::VipPolicy;
    pub use crate::stores::{
        CartStore, ConflictKind, CouponStore, OrderHistoryStore, ProductStore, StoreError,
    };
    pub use crate::types::{
        Cart, CartLine, CartLineKey, Coupon, CouponCode, CustomerId, Money, Product, ProductId,
        ProductStock, SpendingProfile,
    };
}
