//! Eligibility engine behavior tests.
//!
//! Exercises the full gate sequence against in-memory stores: issuance,
//! cooldown exclusion, single-active-coupon enforcement, selection gating,
//! lazy expiry, and code-collision retries.
//!
//! Run with: `cargo test --test eligibility_engine_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)] // Tests panic with context on unexpected outcomes

use chrono::{Duration, Months};
use std::sync::Arc;
use storefront_core::eligibility::{
    BatchOutcome, ClaimOutcome, EligibilityEngine, RejectionReason, VipTier,
};
use storefront_core::environment::{Clock, CodeGenerator, SelectionPolicy};
use storefront_core::policy::VipPolicy;
use storefront_core::stores::CouponStore;
use storefront_core::types::CustomerId;
use storefront_testing::helpers::{init_tracing, profile, vip_coupon};
use storefront_testing::mocks::{
    test_clock, FixedSelection, InMemoryCoupons, InMemoryOrderHistory, SelectSet, SequentialCodes,
};

struct Fixture {
    orders: Arc<InMemoryOrderHistory>,
    coupons: Arc<InMemoryCoupons>,
    engine: EligibilityEngine,
}

fn fixture(selection: Arc<dyn SelectionPolicy>) -> Fixture {
    init_tracing();
    let orders = Arc::new(InMemoryOrderHistory::new());
    let coupons = Arc::new(InMemoryCoupons::new());
    let codes: Arc<dyn CodeGenerator> = Arc::new(SequentialCodes::new());
    let engine = EligibilityEngine::new(
        orders.clone(),
        coupons.clone(),
        Arc::new(test_clock()),
        selection,
        codes,
        VipPolicy::default(),
    );
    Fixture {
        orders,
        coupons,
        engine,
    }
}

#[tokio::test]
async fn platinum_customer_claims_a_coupon() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    let outcome = fx.engine.claim(customer).await.expect("claim");
    let ClaimOutcome::Issued { coupon, tier } = outcome else {
        panic!("expected issuance, got {outcome:?}");
    };

    assert_eq!(tier, VipTier::Platinum);
    assert_eq!(coupon.discount_percent, 35);
    assert_eq!(coupon.minimum_amount.dollars(), 100);
    assert_eq!(coupon.expires_at, test_clock().now() + Duration::days(180));
    assert!(coupon.is_active);
    assert!(coupon.code.has_prefix("VIP"));
    assert_eq!(coupon.code.as_str().len(), 9);
    assert_eq!(fx.coupons.all().len(), 1);
}

#[tokio::test]
async fn evaluate_reports_without_side_effects() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    let report = fx.engine.evaluate(customer).await.expect("evaluate");
    assert!(report.is_eligible);
    assert!(report.meets_basic_criteria);
    assert_eq!(report.tier, VipTier::Platinum);
    assert!(!report.has_vip_coupon);
    assert_eq!(report.order_count, 10);
    assert_eq!(report.avg_order_value.dollars(), 250);

    // Checking eligibility never creates a coupon.
    assert!(fx.coupons.all().is_empty());
}

#[tokio::test]
async fn unknown_customer_evaluates_as_ineligible() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let report = fx.engine.evaluate(CustomerId::new()).await.expect("evaluate");
    assert!(!report.is_eligible);
    assert_eq!(report.tier, VipTier::None);
    assert_eq!(report.order_count, 0);
    // The reason carries the totals so a UI can explain the shortfall.
    assert!(report.eligibility_reason.contains("$0.00"));
}

#[tokio::test]
async fn second_claim_reports_existing_coupon() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    let first = fx.engine.claim(customer).await.expect("first claim");
    let ClaimOutcome::Issued { coupon, .. } = first else {
        panic!("expected issuance");
    };

    let second = fx.engine.claim(customer).await.expect("second claim");
    let ClaimOutcome::Rejected {
        reason,
        existing_coupon,
        report,
    } = second
    else {
        panic!("expected rejection");
    };
    assert_eq!(reason, RejectionReason::AlreadyHasActiveCoupon);
    assert_eq!(existing_coupon.map(|c| c.code), Some(coupon.code));
    assert!(report.has_vip_coupon);
    assert_eq!(fx.coupons.all().len(), 1);
}

#[tokio::test]
async fn recent_coupon_blocks_reissue_even_after_redemption() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    // Issued two months ago and already redeemed (inactive): the cooldown
    // still applies, regardless of qualification.
    let two_months_ago = test_clock().now() - Months::new(2);
    fx.coupons
        .insert(&vip_coupon(customer, "VIPOLD001", two_months_ago, 90, false))
        .await
        .expect("seed coupon");

    let outcome = fx.engine.claim(customer).await.expect("claim");
    let ClaimOutcome::Rejected { reason, report, .. } = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(reason, RejectionReason::InCooldown);
    assert!(!report.is_eligible);
    assert_eq!(fx.coupons.all().len(), 1);
}

#[tokio::test]
async fn coupon_older_than_cooldown_allows_reissue() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    let four_months_ago = test_clock().now() - Months::new(4);
    fx.coupons
        .insert(&vip_coupon(customer, "VIPOLD002", four_months_ago, 30, false))
        .await
        .expect("seed coupon");

    let outcome = fx.engine.claim(customer).await.expect("claim");
    assert!(matches!(outcome, ClaimOutcome::Issued { .. }));
    assert_eq!(fx.coupons.all().len(), 2);
}

#[tokio::test]
async fn stale_active_coupon_is_lazily_deactivated() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    // Still flagged active, but its 30-day validity lapsed months ago.
    let four_months_ago = test_clock().now() - Months::new(4);
    fx.coupons
        .insert(&vip_coupon(customer, "VIPSTALE1", four_months_ago, 30, true))
        .await
        .expect("seed coupon");

    let outcome = fx.engine.claim(customer).await.expect("claim");
    assert!(matches!(outcome, ClaimOutcome::Issued { .. }));

    let stored = fx.coupons.all();
    assert_eq!(stored.len(), 2);
    let old = stored
        .iter()
        .find(|c| c.code.as_str() == "VIPSTALE1")
        .expect("old coupon kept");
    assert!(!old.is_active);
}

#[tokio::test]
async fn unqualified_customer_is_rejected_with_detail() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 400, 3));

    let outcome = fx.engine.claim(customer).await.expect("claim");
    let ClaimOutcome::Rejected { reason, report, .. } = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(reason, RejectionReason::DoesNotMeetCriteria);
    assert_eq!(report.tier, VipTier::None);
    assert!(report.eligibility_reason.contains("$400.00"));
    assert!(fx.coupons.all().is_empty());
}

#[tokio::test]
async fn qualified_but_unselected_customer_is_rejected() {
    let fx = fixture(Arc::new(FixedSelection(false)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    let outcome = fx.engine.claim(customer).await.expect("claim");
    let ClaimOutcome::Rejected { reason, report, .. } = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(reason, RejectionReason::NotSelected);
    // Selection is a program-size lever, not an eligibility criterion.
    assert!(report.is_eligible);
    assert!(fx.coupons.all().is_empty());
}

#[tokio::test]
async fn code_collision_retries_with_fresh_suffix() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    // Another customer already owns the first code the generator will
    // produce, so issuance must regenerate.
    let other = CustomerId::new();
    fx.coupons
        .insert(&vip_coupon(other, "VIP000001", test_clock().now(), 90, false))
        .await
        .expect("seed colliding code");

    let outcome = fx.engine.claim(customer).await.expect("claim");
    let ClaimOutcome::Issued { coupon, .. } = outcome else {
        panic!("expected issuance");
    };
    assert_eq!(coupon.code.as_str(), "VIP000002");
}

#[tokio::test]
async fn batch_counts_and_details() {
    let created_customer = CustomerId::new();
    let unselected_customer = CustomerId::new();
    let cooled_customer = CustomerId::new();
    let unqualified_customer = CustomerId::new();

    let fx = fixture(Arc::new(SelectSet::admitting([
        created_customer,
        cooled_customer,
        unqualified_customer,
    ])));

    fx.orders.put_profile(profile(created_customer, 2_500, 10));
    fx.orders.put_profile(profile(unselected_customer, 1_800, 6));
    fx.orders.put_profile(profile(cooled_customer, 2_200, 9));
    fx.orders.put_profile(profile(unqualified_customer, 300, 2));

    let two_months_ago = test_clock().now() - Months::new(2);
    fx.coupons
        .insert(&vip_coupon(cooled_customer, "VIPCOOL01", two_months_ago, 90, false))
        .await
        .expect("seed coupon");

    let summary = fx.engine.evaluate_batch().await.expect("batch");
    assert_eq!(summary.created, 1);
    assert_eq!(summary.eligible_not_selected, 1);
    assert_eq!(summary.cooldown_blocked, 1);
    assert_eq!(summary.details.len(), 4);

    let outcome_for = |customer: CustomerId| {
        summary
            .details
            .iter()
            .find(|d| d.customer_id == customer)
            .expect("detail present")
    };
    assert!(matches!(
        outcome_for(created_customer).outcome,
        BatchOutcome::Issued { .. }
    ));
    assert!(matches!(
        outcome_for(unselected_customer).outcome,
        BatchOutcome::NotSelected
    ));
    assert!(matches!(
        outcome_for(cooled_customer).outcome,
        BatchOutcome::CooldownBlocked
    ));
    assert!(matches!(
        outcome_for(unqualified_customer).outcome,
        BatchOutcome::NotQualified
    ));

    // Exactly one coupon came out of the sweep.
    assert_eq!(fx.coupons.all().len(), 2);
}

#[tokio::test]
async fn batch_skips_customers_holding_active_coupons() {
    let fx = fixture(Arc::new(FixedSelection(true)));
    let customer = CustomerId::new();
    fx.orders.put_profile(profile(customer, 2_500, 10));

    fx.coupons
        .insert(&vip_coupon(customer, "VIPHELD01", test_clock().now(), 90, true))
        .await
        .expect("seed active coupon");

    let summary = fx.engine.evaluate_batch().await.expect("batch");
    assert_eq!(summary.created, 0);
    assert!(matches!(
        summary.details.first().map(|d| &d.outcome),
        Some(BatchOutcome::AlreadyActive)
    ));
    assert_eq!(fx.coupons.all().len(), 1);
}
