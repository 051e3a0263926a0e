//! VIP program policy.
//!
//! The knobs operators tune without touching business rules. A `VipPolicy`
//! is an immutable value handed to the engine at construction time, so
//! concurrent evaluations always see one consistent snapshot.

use serde::{Deserialize, Serialize};

/// Configuration for the VIP coupon program.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VipPolicy {
    /// Prefix carried by every program coupon code (default `"VIP"`)
    pub code_prefix: String,
    /// Random characters appended after the prefix (default 6)
    pub code_suffix_len: usize,
    /// Months a customer is blocked from re-issuance after receiving a
    /// program coupon (default 3)
    pub cooldown_months: u32,
    /// Fraction of qualifying customers admitted per evaluation window
    /// (default 0.70)
    pub selection_ratio: f64,
    /// Code regeneration attempts on a uniqueness conflict (default 3)
    pub max_code_attempts: u32,
}

impl Default for VipPolicy {
    fn default() -> Self {
        Self {
            code_prefix: "VIP".to_string(),
            code_suffix_len: 6,
            cooldown_months: 3,
            selection_ratio: 0.70,
            max_code_attempts: 3,
        }
    }
}
