//! Injected dependencies for the domain services.
//!
//! All side-effectful collaborators (time, randomness) sit behind traits so
//! the engine and cart service stay deterministic under test: production
//! wires `SystemClock`/`RandomCodes`/`StableSampling`, tests substitute
//! fixed implementations.

use crate::types::{CouponCode, CustomerId};
use chrono::{DateTime, Datelike, Utc};
use sha2::{Digest, Sha256};

// ============================================================================
// Clock
// ============================================================================

/// Clock trait - abstracts time operations for testability
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// Selection Policy
// ============================================================================

/// Decides whether a qualifying customer is admitted into the VIP program
/// for the current evaluation window.
///
/// This is a policy lever to limit program size, not a technical necessity;
/// implementations must be safe to call repeatedly.
pub trait SelectionPolicy: Send + Sync {
    /// Whether `customer` is selected at time `now`
    fn selects(&self, customer: &CustomerId, now: DateTime<Utc>) -> bool;
}

/// Deterministic, auditable sampling: hashes `(customer id, window index)`
/// and admits the customer when the hash falls under the configured ratio.
///
/// Repeated eligibility checks within one window always return the same
/// answer; the roll only changes when the window advances (every
/// `window_months`, aligned with the issuance cooldown).
#[derive(Clone, Copy, Debug)]
pub struct StableSampling {
    ratio: f64,
    window_months: u32,
}

impl StableSampling {
    /// Creates a sampling policy admitting roughly `ratio` of customers
    /// (clamped to `0.0..=1.0`) per `window_months`-sized window.
    #[must_use]
    pub fn new(ratio: f64, window_months: u32) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            window_months: window_months.max(1),
        }
    }

    fn window_index(&self, now: DateTime<Utc>) -> i64 {
        let months = i64::from(now.year()) * 12 + i64::from(now.month0());
        months / i64::from(self.window_months)
    }
}

impl SelectionPolicy for StableSampling {
    fn selects(&self, customer: &CustomerId, now: DateTime<Utc>) -> bool {
        let mut hasher = Sha256::new();
        hasher.update(customer.as_uuid().as_bytes());
        hasher.update(self.window_index(now).to_le_bytes());
        let digest = hasher.finalize();

        let mut sample = [0_u8; 8];
        sample.copy_from_slice(&digest[..8]);
        let sample = u64::from_le_bytes(sample);

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let threshold = (self.ratio * u64::MAX as f64) as u64;
        sample <= threshold
    }
}

// ============================================================================
// Coupon Code Generation
// ============================================================================

/// Source of coupon codes.
///
/// Generated codes are not guaranteed unique; the persistence layer enforces
/// uniqueness and callers regenerate on conflict.
pub trait CodeGenerator: Send + Sync {
    /// Generates a code: `prefix` followed by `suffix_len` characters
    fn coupon_code(&self, prefix: &str, suffix_len: usize) -> CouponCode;
}

/// Characters a coupon code suffix is drawn from
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Production code generator drawing uniformly from `[A-Z0-9]`
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    fn coupon_code(&self, prefix: &str, suffix_len: usize) -> CouponCode {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let mut code = String::with_capacity(prefix.len() + suffix_len);
        code.push_str(prefix);
        for _ in 0..suffix_len {
            let index = rng.gen_range(0..CODE_CHARSET.len());
            code.push(char::from(CODE_CHARSET[index]));
        }
        CouponCode::new(code)
    }
}
