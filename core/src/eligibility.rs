//! VIP coupon eligibility engine.
//!
//! Decides, for a given customer, whether to issue a VIP discount coupon and
//! at what tier. Classification is pure (spending aggregate in, tier out).
//! Issuance runs a gate sequence (active-coupon check, cooldown, basic
//! qualification, program-size selection) where the first failing gate
//! short-circuits with a structured rejection. Business-rule rejections are
//! reported values, never `Err`; only store failures propagate.

use crate::environment::{Clock, CodeGenerator, SelectionPolicy};
use crate::policy::VipPolicy;
use crate::stores::{ConflictKind, CouponStore, OrderHistoryStore, StoreError};
use crate::types::{Coupon, CouponCode, CustomerId, Money, SpendingProfile};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Tiers
// ============================================================================

/// VIP program tier, ordered by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VipTier {
    /// Does not qualify for the program
    None,
    /// Entry tier
    Bronze,
    /// Mid tier
    Silver,
    /// High tier
    Gold,
    /// Top tier
    Platinum,
}

impl VipTier {
    /// The benefit schedule for this tier; `None` for [`VipTier::None`]
    #[must_use]
    pub const fn benefits(self) -> Option<TierBenefits> {
        match self {
            Self::Platinum => Some(TierBenefits {
                discount_percent: 35,
                minimum_amount: Money::from_dollars(100),
                validity_days: 180,
            }),
            Self::Gold => Some(TierBenefits {
                discount_percent: 30,
                minimum_amount: Money::from_dollars(150),
                validity_days: 120,
            }),
            Self::Silver => Some(TierBenefits {
                discount_percent: 25,
                minimum_amount: Money::from_dollars(200),
                validity_days: 90,
            }),
            Self::Bronze => Some(TierBenefits {
                discount_percent: 20,
                minimum_amount: Money::from_dollars(250),
                validity_days: 90,
            }),
            Self::None => None,
        }
    }
}

impl fmt::Display for VipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        };
        write!(f, "{label}")
    }
}

/// What a coupon at a given tier grants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBenefits {
    /// Discount percentage off the order
    pub discount_percent: u8,
    /// Minimum order amount required to redeem
    pub minimum_amount: Money,
    /// Days until the coupon expires
    pub validity_days: u32,
}

// ============================================================================
// Classification (pure)
// ============================================================================

const PLATINUM_TOTAL: Money = Money::from_dollars(2_000);
const PLATINUM_ORDERS: u32 = 8;
const PLATINUM_AVG: Money = Money::from_dollars(300);

const GOLD_TOTAL: Money = Money::from_dollars(1_200);
const GOLD_ORDERS: u32 = 6;
const GOLD_AVG: Money = Money::from_dollars(250);

const SILVER_TOTAL: Money = Money::from_dollars(800);
const SILVER_ORDERS: u32 = 4;
const SILVER_AVG: Money = Money::from_dollars(200);

const ULTRA_TOTAL: Money = Money::from_dollars(2_000);
const ULTRA_ALT_TOTAL: Money = Money::from_dollars(1_500);
const ULTRA_ALT_ORDERS: u32 = 6;

const LOYAL_ORDERS: u32 = 8;
const LOYAL_TOTAL: Money = Money::from_dollars(1_200);
const LOYAL_AVG: Money = Money::from_dollars(200);

const HIGH_VALUE_AVG: Money = Money::from_dollars(500);
const HIGH_VALUE_ORDERS: u32 = 4;
const HIGH_VALUE_TOTAL: Money = Money::from_dollars(1_000);

/// How a customer qualified for the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualificationPath {
    /// Very high lifetime spend
    UltraPremium,
    /// Many orders with sustained spend
    Loyal,
    /// Few but large orders
    HighValue,
}

impl fmt::Display for QualificationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UltraPremium => "ultra-premium",
            Self::Loyal => "loyal",
            Self::HighValue => "high-value",
        };
        write!(f, "{label}")
    }
}

/// The qualification path a spending profile satisfies, if any.
///
/// Paths are checked in declaration order and the first match is reported.
#[must_use]
pub fn qualification_path(profile: &SpendingProfile) -> Option<QualificationPath> {
    let total = profile.total_spent;
    let orders = profile.order_count;
    let avg = profile.avg_order_value;

    if total >= ULTRA_TOTAL || (total >= ULTRA_ALT_TOTAL && orders >= ULTRA_ALT_ORDERS) {
        Some(QualificationPath::UltraPremium)
    } else if orders >= LOYAL_ORDERS && total >= LOYAL_TOTAL && avg >= LOYAL_AVG {
        Some(QualificationPath::Loyal)
    } else if avg >= HIGH_VALUE_AVG && orders >= HIGH_VALUE_ORDERS && total >= HIGH_VALUE_TOTAL {
        Some(QualificationPath::HighValue)
    } else {
        None
    }
}

/// Classifies a spending profile into a tier.
///
/// Tiers are evaluated in descending order of value and the first match
/// wins; a profile that fails basic qualification is [`VipTier::None`]
/// regardless of the tier thresholds.
#[must_use]
pub fn classify(profile: &SpendingProfile) -> VipTier {
    if qualification_path(profile).is_none() {
        return VipTier::None;
    }

    let total = profile.total_spent;
    let orders = profile.order_count;
    let avg = profile.avg_order_value;

    if total >= PLATINUM_TOTAL || (orders >= PLATINUM_ORDERS && avg >= PLATINUM_AVG) {
        VipTier::Platinum
    } else if total >= GOLD_TOTAL || (orders >= GOLD_ORDERS && avg >= GOLD_AVG) {
        VipTier::Gold
    } else if total >= SILVER_TOTAL || (orders >= SILVER_ORDERS && avg >= SILVER_AVG) {
        VipTier::Silver
    } else {
        VipTier::Bronze
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why a claim was rejected. Each reason is distinguishable so the caller
/// can render specific guidance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Basic qualification criteria not met
    #[serde(rename = "does_not_meet_criteria")]
    DoesNotMeetCriteria,
    /// A program coupon was issued within the cooldown window
    #[serde(rename = "in_cooldown")]
    InCooldown,
    /// The customer already holds an active program coupon
    #[serde(rename = "already_has_vip_coupon")]
    AlreadyHasActiveCoupon,
    /// Qualified, but not admitted by the selection policy this window
    #[serde(rename = "not_selected")]
    NotSelected,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DoesNotMeetCriteria => "does_not_meet_criteria",
            Self::InCooldown => "in_cooldown",
            Self::AlreadyHasActiveCoupon => "already_has_vip_coupon",
            Self::NotSelected => "not_selected",
        };
        write!(f, "{label}")
    }
}

/// Side-effect-free eligibility evaluation for one customer.
///
/// Carries enough detail (totals vs. thresholds in `eligibility_reason`)
/// for a UI to explain how far the customer is from qualifying.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EligibilityReport {
    /// Evaluated customer
    pub customer_id: CustomerId,
    /// Whether a claim would proceed to the selection gate
    pub is_eligible: bool,
    /// Whether any qualification path is satisfied
    pub meets_basic_criteria: bool,
    /// Lifetime completed-order spend
    pub total_spent: Money,
    /// Completed order count
    pub order_count: u32,
    /// Average order value
    pub avg_order_value: Money,
    /// Classified tier
    pub tier: VipTier,
    /// Whether an active, unexpired program coupon is already held
    pub has_vip_coupon: bool,
    /// Human-readable explanation of the customer's standing
    pub eligibility_reason: String,
}

/// Result of a claim attempt.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// A coupon was created and persisted
    Issued {
        /// The new coupon
        coupon: Coupon,
        /// The tier the coupon was issued at
        tier: VipTier,
    },
    /// The claim was rejected by a gate
    Rejected {
        /// Which gate rejected the claim
        reason: RejectionReason,
        /// The already-held coupon, when that is the reason
        existing_coupon: Option<Coupon>,
        /// Full evaluation detail for messaging
        report: EligibilityReport,
    },
}

/// Per-customer outcome inside a batch evaluation.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// A coupon was issued
    Issued {
        /// The new coupon's code
        code: CouponCode,
    },
    /// Qualified but not admitted by the selection policy
    NotSelected,
    /// Blocked by the issuance cooldown
    CooldownBlocked,
    /// Already holds an active program coupon
    AlreadyActive,
    /// Basic qualification criteria not met
    NotQualified,
    /// The customer's evaluation hit a store failure; the sweep continued
    Failed {
        /// Store failure detail
        error: String,
    },
}

/// Detail record for one customer in a batch evaluation.
#[derive(Clone, Debug, Serialize)]
pub struct BatchDetail {
    /// Evaluated customer
    pub customer_id: CustomerId,
    /// Classified tier at evaluation time
    pub tier: VipTier,
    /// What happened
    pub outcome: BatchOutcome,
}

/// Summary of a batch evaluation sweep.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchSummary {
    /// Coupons created
    pub created: u32,
    /// Qualified customers not admitted by the selection policy
    pub eligible_not_selected: u32,
    /// Customers blocked by the issuance cooldown
    pub cooldown_blocked: u32,
    /// Per-customer detail records
    pub details: Vec<BatchDetail>,
}

// ============================================================================
// Engine
// ============================================================================

/// Gate inputs computed once per evaluation.
struct Assessment {
    now: DateTime<Utc>,
    active: Option<Coupon>,
    in_cooldown: bool,
    path: Option<QualificationPath>,
    tier: VipTier,
}

/// The VIP eligibility engine.
///
/// All collaborators are injected; the policy is an immutable snapshot taken
/// at construction, so concurrent evaluations see consistent settings.
#[derive(Clone)]
pub struct EligibilityEngine {
    orders: Arc<dyn OrderHistoryStore>,
    coupons: Arc<dyn CouponStore>,
    clock: Arc<dyn Clock>,
    selection: Arc<dyn SelectionPolicy>,
    codes: Arc<dyn CodeGenerator>,
    policy: VipPolicy,
}

impl EligibilityEngine {
    /// Creates an engine over the given stores and policy
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderHistoryStore>,
        coupons: Arc<dyn CouponStore>,
        clock: Arc<dyn Clock>,
        selection: Arc<dyn SelectionPolicy>,
        codes: Arc<dyn CodeGenerator>,
        policy: VipPolicy,
    ) -> Self {
        Self {
            orders,
            coupons,
            clock,
            selection,
            codes,
            policy,
        }
    }

    /// The policy this engine was built with
    #[must_use]
    pub const fn policy(&self) -> &VipPolicy {
        &self.policy
    }

    /// Evaluates one customer without side effects (no coupon is created).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on infrastructure failure; ineligibility is a
    /// normal reported outcome.
    pub async fn evaluate(&self, customer_id: CustomerId) -> Result<EligibilityReport, StoreError> {
        let profile = self.profile_for(customer_id).await?;
        let assessment = self.assess(&profile).await?;
        Ok(self.report(&profile, &assessment))
    }

    /// Re-runs the evaluation and, if every gate passes, issues one coupon.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on infrastructure failure; every business-rule
    /// rejection is reported in the returned [`ClaimOutcome`].
    pub async fn claim(&self, customer_id: CustomerId) -> Result<ClaimOutcome, StoreError> {
        let profile = self.profile_for(customer_id).await?;
        let assessment = self.assess(&profile).await?;
        let report = self.report(&profile, &assessment);

        if let Some(existing) = assessment.active.clone() {
            tracing::debug!(customer = %customer_id, code = %existing.code, "claim rejected: active coupon held");
            return Ok(ClaimOutcome::Rejected {
                reason: RejectionReason::AlreadyHasActiveCoupon,
                existing_coupon: Some(existing),
                report,
            });
        }

        if assessment.in_cooldown {
            tracing::debug!(customer = %customer_id, "claim rejected: in cooldown");
            return Ok(ClaimOutcome::Rejected {
                reason: RejectionReason::InCooldown,
                existing_coupon: None,
                report,
            });
        }

        let Some(benefits) = assessment.tier.benefits() else {
            tracing::debug!(customer = %customer_id, "claim rejected: criteria not met");
            return Ok(ClaimOutcome::Rejected {
                reason: RejectionReason::DoesNotMeetCriteria,
                existing_coupon: None,
                report,
            });
        };

        if !self.selection.selects(&customer_id, assessment.now) {
            tracing::debug!(customer = %customer_id, "claim rejected: not selected this window");
            return Ok(ClaimOutcome::Rejected {
                reason: RejectionReason::NotSelected,
                existing_coupon: None,
                report,
            });
        }

        match self
            .issue(customer_id, assessment.tier, benefits, assessment.now)
            .await
        {
            Ok(coupon) => Ok(ClaimOutcome::Issued {
                coupon,
                tier: assessment.tier,
            }),
            // Lost the race against a concurrent issuance: the datastore's
            // one-active-per-customer constraint is authoritative.
            Err(StoreError::Conflict(ConflictKind::ActiveCoupon)) => {
                let existing = self
                    .usable_active_coupon(&customer_id, assessment.now)
                    .await?;
                Ok(ClaimOutcome::Rejected {
                    reason: RejectionReason::AlreadyHasActiveCoupon,
                    existing_coupon: existing,
                    report,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Scans all customer aggregates, classifies, gates, and issues coupons
    /// in one pass. Intended for periodic administrative invocation.
    ///
    /// A store failure while evaluating one customer is recorded in that
    /// customer's detail record and the sweep continues.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the aggregate scan itself fails.
    pub async fn evaluate_batch(&self) -> Result<BatchSummary, StoreError> {
        let profiles = self.orders.all_spending_profiles().await?;
        let scanned = profiles.len();
        let mut summary = BatchSummary::default();

        for profile in profiles {
            let customer_id = profile.customer_id;
            let detail = match self.gate_one(&profile).await {
                Ok(detail) => detail,
                Err(error) => {
                    tracing::warn!(customer = %customer_id, %error, "batch evaluation failed for customer");
                    BatchDetail {
                        customer_id,
                        tier: VipTier::None,
                        outcome: BatchOutcome::Failed {
                            error: error.to_string(),
                        },
                    }
                }
            };

            match detail.outcome {
                BatchOutcome::Issued { .. } => summary.created += 1,
                BatchOutcome::NotSelected => summary.eligible_not_selected += 1,
                BatchOutcome::CooldownBlocked => summary.cooldown_blocked += 1,
                _ => {}
            }
            summary.details.push(detail);
        }

        tracing::info!(
            scanned,
            created = summary.created,
            not_selected = summary.eligible_not_selected,
            cooldown_blocked = summary.cooldown_blocked,
            "batch VIP evaluation complete"
        );
        Ok(summary)
    }

    /// Applies the full gate sequence to one profile, issuing on success.
    async fn gate_one(&self, profile: &SpendingProfile) -> Result<BatchDetail, StoreError> {
        let assessment = self.assess(profile).await?;
        let tier = assessment.tier;

        let outcome = if assessment.active.is_some() {
            BatchOutcome::AlreadyActive
        } else if assessment.in_cooldown {
            BatchOutcome::CooldownBlocked
        } else if let Some(benefits) = tier.benefits() {
            if self.selection.selects(&profile.customer_id, assessment.now) {
                match self
                    .issue(profile.customer_id, tier, benefits, assessment.now)
                    .await
                {
                    Ok(coupon) => BatchOutcome::Issued { code: coupon.code },
                    Err(StoreError::Conflict(ConflictKind::ActiveCoupon)) => {
                        BatchOutcome::AlreadyActive
                    }
                    Err(other) => return Err(other),
                }
            } else {
                BatchOutcome::NotSelected
            }
        } else {
            BatchOutcome::NotQualified
        };

        Ok(BatchDetail {
            customer_id: profile.customer_id,
            tier,
            outcome,
        })
    }

    /// Loads the spending aggregate, defaulting to an empty profile for
    /// customers with no completed orders.
    async fn profile_for(&self, customer_id: CustomerId) -> Result<SpendingProfile, StoreError> {
        Ok(self
            .orders
            .spending_profile(&customer_id)
            .await?
            .unwrap_or_else(|| SpendingProfile::empty(customer_id)))
    }

    /// Computes all gate inputs for one profile.
    async fn assess(&self, profile: &SpendingProfile) -> Result<Assessment, StoreError> {
        let now = self.clock.now();
        let active = self.usable_active_coupon(&profile.customer_id, now).await?;

        let latest = self
            .coupons
            .latest_coupon_with_prefix(&profile.customer_id, &self.policy.code_prefix)
            .await?;
        let in_cooldown = now
            .checked_sub_months(Months::new(self.policy.cooldown_months))
            .is_some_and(|cutoff| latest.is_some_and(|coupon| coupon.created_at > cutoff));

        Ok(Assessment {
            now,
            active,
            in_cooldown,
            path: qualification_path(profile),
            tier: classify(profile),
        })
    }

    /// The customer's usable active program coupon, deactivating a stale
    /// (expired but still flagged active) one lazily along the way.
    async fn usable_active_coupon(
        &self,
        customer: &CustomerId,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, StoreError> {
        let Some(coupon) = self
            .coupons
            .active_coupon_with_prefix(customer, &self.policy.code_prefix)
            .await?
        else {
            return Ok(None);
        };

        if coupon.is_usable(now) {
            return Ok(Some(coupon));
        }
        if coupon.is_stale(now) {
            tracing::debug!(customer = %customer, code = %coupon.code, "deactivating expired coupon");
            self.coupons.deactivate(customer, &coupon.code).await?;
        }
        Ok(None)
    }

    /// Persists a new coupon, regenerating the code on a uniqueness
    /// conflict up to the configured attempt bound.
    async fn issue(
        &self,
        customer_id: CustomerId,
        tier: VipTier,
        benefits: TierBenefits,
        now: DateTime<Utc>,
    ) -> Result<Coupon, StoreError> {
        for attempt in 1..=self.policy.max_code_attempts {
            let code = self
                .codes
                .coupon_code(&self.policy.code_prefix, self.policy.code_suffix_len);
            let coupon = Coupon {
                code,
                discount_percent: benefits.discount_percent,
                minimum_amount: benefits.minimum_amount,
                expires_at: now + Duration::days(i64::from(benefits.validity_days)),
                is_active: true,
                customer_id,
                created_at: now,
            };

            match self.coupons.insert(&coupon).await {
                Ok(()) => {
                    tracing::info!(
                        customer = %customer_id,
                        tier = %tier,
                        code = %coupon.code,
                        "issued VIP coupon"
                    );
                    return Ok(coupon);
                }
                Err(StoreError::Conflict(ConflictKind::CouponCode)) => {
                    tracing::debug!(customer = %customer_id, attempt, "coupon code collision, regenerating");
                }
                Err(other) => return Err(other),
            }
        }
        Err(StoreError::Conflict(ConflictKind::CouponCode))
    }

    /// Builds the customer-facing report from the gate inputs.
    fn report(&self, profile: &SpendingProfile, assessment: &Assessment) -> EligibilityReport {
        let meets_basic_criteria = assessment.path.is_some();
        let has_vip_coupon = assessment.active.is_some();
        let is_eligible = meets_basic_criteria && !has_vip_coupon && !assessment.in_cooldown;

        let eligibility_reason = if let Some(coupon) = &assessment.active {
            format!("already holds active coupon {}", coupon.code)
        } else if assessment.in_cooldown {
            format!(
                "a {} coupon was issued within the last {} months",
                self.policy.code_prefix, self.policy.cooldown_months
            )
        } else if let Some(path) = assessment.path {
            format!("qualifies via the {path} path at the {} tier", assessment.tier)
        } else {
            format!(
                "below program thresholds: {} spent across {} orders (average {}); \
                 nearest paths start at {ULTRA_ALT_TOTAL} total over {ULTRA_ALT_ORDERS} orders, \
                 or {HIGH_VALUE_TOTAL} total with a {HIGH_VALUE_AVG} average",
                profile.total_spent, profile.order_count, profile.avg_order_value
            )
        };

        EligibilityReport {
            customer_id: profile.customer_id,
            is_eligible,
            meets_basic_criteria,
            total_spent: profile.total_spent,
            order_count: profile.order_count,
            avg_order_value: profile.avg_order_value,
            tier: assessment.tier,
            has_vip_coupon,
            eligibility_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(total_dollars: u64, orders: u32) -> SpendingProfile {
        SpendingProfile::new(
            CustomerId::new(),
            Money::from_dollars(total_dollars),
            orders,
            None,
            None,
        )
    }

    #[test]
    fn platinum_by_total_spend() {
        // $2500 over 10 orders averages $250.
        let p = profile(2_500, 10);
        assert_eq!(p.avg_order_value, Money::from_dollars(250));
        assert_eq!(classify(&p), VipTier::Platinum);
        assert_eq!(qualification_path(&p), Some(QualificationPath::UltraPremium));
    }

    #[test]
    fn platinum_benefits_schedule() {
        let benefits = VipTier::Platinum.benefits().unwrap_or(TierBenefits {
            discount_percent: 0,
            minimum_amount: Money::ZERO,
            validity_days: 0,
        });
        assert_eq!(benefits.discount_percent, 35);
        assert_eq!(benefits.minimum_amount, Money::from_dollars(100));
        assert_eq!(benefits.validity_days, 180);
        assert!(VipTier::None.benefits().is_none());
    }

    #[test]
    fn gold_by_total_spend() {
        // $1500 over 6 orders: ultra-premium alternate path, below platinum.
        let p = profile(1_500, 6);
        assert_eq!(classify(&p), VipTier::Gold);
    }

    #[test]
    fn sustained_spend_qualifies_gold() {
        // 8 orders, $1200 total, $150 average: no path (loyal needs $200 avg).
        let below_avg = profile(1_200, 8);
        assert_eq!(below_avg.avg_order_value, Money::from_dollars(150));
        assert_eq!(qualification_path(&below_avg), None);

        // $1600 over 8 orders averages $200 and qualifies (ultra-premium
        // alternate fires before the loyal path gets a look).
        let qualified = profile(1_600, 8);
        assert_eq!(
            qualification_path(&qualified),
            Some(QualificationPath::UltraPremium)
        );
        assert_eq!(classify(&qualified), VipTier::Gold);
    }

    #[test]
    fn lower_tier_branches_on_hand_built_aggregates() {
        // With the average derived as total/count, every consistent
        // qualifier lands at gold or above; the silver/bronze branches and
        // the loyal/high-value paths are only reachable when the aggregate
        // fields disagree (e.g. upstream rounding). Exercise them directly.
        let silver = SpendingProfile {
            customer_id: CustomerId::new(),
            total_spent: Money::from_dollars(1_000),
            order_count: 4,
            avg_order_value: Money::from_dollars(500),
            first_order_at: None,
            last_order_at: None,
        };
        assert_eq!(qualification_path(&silver), Some(QualificationPath::HighValue));
        assert_eq!(classify(&silver), VipTier::Silver);

        let loyal = SpendingProfile {
            avg_order_value: Money::from_dollars(200),
            ..profile(1_200, 8)
        };
        assert_eq!(qualification_path(&loyal), Some(QualificationPath::Loyal));
        assert_eq!(classify(&loyal), VipTier::Gold);
    }

    #[test]
    fn tier_thresholds_alone_do_not_qualify() {
        // $900 over 4 orders clears the silver threshold but no
        // qualification path, so the customer is out of the program.
        let p = profile(900, 4);
        assert_eq!(qualification_path(&p), None);
        assert_eq!(classify(&p), VipTier::None);
    }

    #[test]
    fn exact_threshold_boundaries() {
        assert_eq!(classify(&profile(2_000, 1)), VipTier::Platinum);
        // One cent below the ultra-premium floor with no other path.
        let just_under = SpendingProfile::new(
            CustomerId::new(),
            Money::from_cents(199_999),
            1,
            None,
            None,
        );
        assert_eq!(classify(&just_under), VipTier::None);
    }

    #[test]
    fn tier_ordering() {
        assert!(VipTier::None < VipTier::Bronze);
        assert!(VipTier::Bronze < VipTier::Silver);
        assert!(VipTier::Silver < VipTier::Gold);
        assert!(VipTier::Gold < VipTier::Platinum);
    }

    #[test]
    fn more_total_spend_never_lowers_the_tier() {
        // Spot check of the monotonicity property (the full property is
        // exercised with proptest in storefront-testing).
        for orders in [1, 4, 6, 8, 12] {
            let mut last = VipTier::None;
            for total in (0..4_000).step_by(50) {
                let tier = classify(&profile(total, orders));
                assert!(tier >= last, "tier dropped at total={total}, orders={orders}");
                last = tier;
            }
        }
    }

    #[test]
    fn rejection_reason_wire_labels() {
        assert_eq!(
            RejectionReason::AlreadyHasActiveCoupon.to_string(),
            "already_has_vip_coupon"
        );
        assert_eq!(RejectionReason::InCooldown.to_string(), "in_cooldown");
    }
}
