//! VIP program API endpoints.
//!
//! - `GET /api/vip/eligibility` - Check the caller's eligibility (no side
//!   effects; ineligibility is a normal 200 outcome)
//! - `POST /api/vip/claim` - Claim a coupon for the caller
//! - `POST /api/admin/vip/evaluations` - Run the administrative batch sweep
//!
//! Business-rule rejections are 200-family payloads carrying a
//! distinguishable `reason` plus the evaluation report, so a UI can explain
//! how far the customer is from qualifying. Only infrastructure failures
//! surface as 5xx.

use crate::error::AppError;
use crate::extractors::SessionCustomer;
use crate::metrics;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use storefront_core::eligibility::{BatchOutcome, BatchSummary, ClaimOutcome, EligibilityReport};

/// Check the caller's eligibility without issuing anything.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/vip/eligibility \
///   -H "X-Customer-Id: 550e8400-e29b-41d4-a716-446655440000"
/// ```
///
/// Response:
/// ```json
/// {
///   "customer_id": "550e8400-e29b-41d4-a716-446655440000",
///   "is_eligible": true,
///   "meets_basic_criteria": true,
///   "total_spent": 250000,
///   "order_count": 10,
///   "avg_order_value": 25000,
///   "tier": "platinum",
///   "has_vip_coupon": false,
///   "eligibility_reason": "qualifies via the ultra-premium path at the platinum tier"
/// }
/// ```
pub async fn check_eligibility(
    SessionCustomer(customer_id): SessionCustomer,
    State(state): State<AppState>,
) -> Result<Json<EligibilityReport>, AppError> {
    let report = state.engine.evaluate(customer_id).await?;
    Ok(Json(report))
}

/// Claim a VIP coupon for the caller.
///
/// Returns 201 with the issued coupon when every gate passes, or 200 with a
/// structured rejection (`does_not_meet_criteria`, `in_cooldown`,
/// `already_has_vip_coupon`, `not_selected`) otherwise.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/vip/claim \
///   -H "X-Customer-Id: 550e8400-e29b-41d4-a716-446655440000"
/// ```
pub async fn claim_coupon(
    SessionCustomer(customer_id): SessionCustomer,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ClaimOutcome>), AppError> {
    let outcome = state.engine.claim(customer_id).await?;
    let status = match &outcome {
        ClaimOutcome::Issued { tier, .. } => {
            metrics::record_coupon_issued(*tier);
            StatusCode::CREATED
        }
        ClaimOutcome::Rejected { reason, .. } => {
            metrics::record_claim_rejected(*reason);
            StatusCode::OK
        }
    };
    Ok((status, Json(outcome)))
}

/// Run the administrative batch evaluation sweep.
///
/// Scans every customer aggregate, classifies, gates, and issues coupons in
/// one pass; returns the summary counts and per-customer details.
pub async fn run_batch_evaluation(
    State(state): State<AppState>,
) -> Result<Json<BatchSummary>, AppError> {
    let summary = state.engine.evaluate_batch().await?;
    metrics::record_batch_run(summary.details.len(), summary.created);
    for detail in &summary.details {
        if matches!(detail.outcome, BatchOutcome::Issued { .. }) {
            metrics::record_coupon_issued(detail.tier);
        }
    }
    Ok(Json(summary))
}
