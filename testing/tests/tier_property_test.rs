//! Property-based tests for tier classification.
//!
//! Run with: `cargo test --test tier_property_test`

use proptest::prelude::*;
use storefront_core::eligibility::{classify, VipTier};
use storefront_core::types::{CustomerId, Money, SpendingProfile};

fn aggregate(total_cents: u64, orders: u32, avg_cents: u64) -> SpendingProfile {
    // Fields are set independently so the property quantifies over the full
    // aggregate space, not just self-consistent averages.
    SpendingProfile {
        customer_id: CustomerId::new(),
        total_spent: Money::from_cents(total_cents),
        order_count: orders,
        avg_order_value: Money::from_cents(avg_cents),
        first_order_at: None,
        last_order_at: None,
    }
}

proptest! {
    /// Raising `total_spent` with every other field held equal never lowers
    /// the tier (ordering: none < bronze < silver < gold < platinum).
    #[test]
    fn tier_is_monotone_in_total_spent(
        total_low in 0_u64..400_000,
        bump in 1_u64..400_000,
        orders in 0_u32..20,
        avg in 0_u64..100_000,
    ) {
        let lower = classify(&aggregate(total_low, orders, avg));
        let higher = classify(&aggregate(total_low + bump, orders, avg));
        prop_assert!(higher >= lower, "{higher:?} < {lower:?}");
    }

    /// A classified tier always has a benefit schedule, and `none` never does.
    #[test]
    fn qualified_tiers_carry_benefits(
        total in 0_u64..400_000,
        orders in 0_u32..20,
        avg in 0_u64..100_000,
    ) {
        let tier = classify(&aggregate(total, orders, avg));
        prop_assert_eq!(tier.benefits().is_some(), tier != VipTier::None);
    }

    /// Self-consistent aggregates (average derived from total and count)
    /// are monotone in total spend as well.
    #[test]
    fn derived_average_profiles_are_monotone(
        total_low in 0_u64..4_000,
        bump in 1_u64..4_000,
        orders in 1_u32..20,
    ) {
        let lower = classify(&SpendingProfile::new(
            CustomerId::new(),
            Money::from_dollars(total_low),
            orders,
            None,
            None,
        ));
        let higher = classify(&SpendingProfile::new(
            CustomerId::new(),
            Money::from_dollars(total_low + bump),
            orders,
            None,
            None,
        ));
        prop_assert!(higher >= lower, "{higher:?} < {lower:?}");
    }
}
