//! Axum HTTP layer for Storefront.
//!
//! Thin adapters over the `storefront-core` services:
//!
//! 1. **Extract** the authenticated customer and request data
//! 2. **Dispatch** into the eligibility engine or cart service
//! 3. **Map** the outcome to HTTP - business rejections stay 200-family
//!    payloads with structured reasons; validation failures become 4xx;
//!    only infrastructure failures become 5xx

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
