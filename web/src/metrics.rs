//! Business metrics for the Storefront service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `storefront_vip_coupons_issued_total{tier}` - Coupons issued by tier
//! - `storefront_vip_claims_rejected_total{reason}` - Claims rejected by reason
//! - `storefront_vip_batch_runs_total` - Batch evaluation sweeps
//! - `storefront_cart_mutations_total{operation}` - Cart mutations by kind
//! - `storefront_cart_rejections_total{cause}` - Cart rejections by cause
//!
//! ## Gauges
//! - `storefront_vip_batch_last_scanned` - Customers scanned by the last sweep

use metrics::{describe_counter, describe_gauge};
use storefront_core::cart::CartError;
use storefront_core::eligibility::{RejectionReason, VipTier};

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics
/// are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "storefront_vip_coupons_issued_total",
        "Total VIP coupons issued, labeled by tier"
    );
    describe_counter!(
        "storefront_vip_claims_rejected_total",
        "Total VIP claims rejected, labeled by rejection reason"
    );
    describe_counter!(
        "storefront_vip_batch_runs_total",
        "Total administrative batch evaluation sweeps"
    );
    describe_gauge!(
        "storefront_vip_batch_last_scanned",
        "Customers scanned by the most recent batch sweep"
    );
    describe_counter!(
        "storefront_cart_mutations_total",
        "Total cart mutations, labeled by operation (add, update, remove, clear)"
    );
    describe_counter!(
        "storefront_cart_rejections_total",
        "Total rejected cart mutations, labeled by cause"
    );

    tracing::info!("Business metrics registered");
}

/// Record an issued VIP coupon.
pub fn record_coupon_issued(tier: VipTier) {
    metrics::counter!("storefront_vip_coupons_issued_total", "tier" => tier.to_string())
        .increment(1);
}

/// Record a rejected VIP claim.
pub fn record_claim_rejected(reason: RejectionReason) {
    metrics::counter!("storefront_vip_claims_rejected_total", "reason" => reason.to_string())
        .increment(1);
}

/// Record a batch evaluation sweep.
pub fn record_batch_run(scanned: usize, created: u32) {
    metrics::counter!("storefront_vip_batch_runs_total").increment(1);
    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!("storefront_vip_batch_last_scanned").set(scanned as f64);
    tracing::debug!(scanned, created, "Recorded batch evaluation metrics");
}

/// Record a successful cart mutation.
pub fn record_cart_mutation(operation: &'static str) {
    metrics::counter!("storefront_cart_mutations_total", "operation" => operation).increment(1);
}

/// Record a rejected cart mutation.
pub fn record_cart_rejection(error: &CartError) {
    let cause = match error {
        CartError::ProductNotFound(_) => "product_not_found",
        CartError::SizeRequired => "size_required",
        CartError::InvalidQuantity => "invalid_quantity",
        CartError::InsufficientStock { .. } => "insufficient_stock",
        CartError::LineNotFound(_) => "line_not_found",
        CartError::Store(_) => "store_failure",
    };
    metrics::counter!("storefront_cart_rejections_total", "cause" => cause).increment(1);
}
