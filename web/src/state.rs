//! Application state for the Storefront HTTP server.
//!
//! Contains the two domain services the handlers dispatch into, each
//! already wired with its stores, clock, and policy.

use crate::config::Config;
use std::sync::Arc;
use storefront_core::cart::CartService;
use storefront_core::eligibility::EligibilityEngine;
use storefront_core::environment::{RandomCodes, StableSampling, SystemClock};
use storefront_core::stores::StoreError;
use storefront_postgres::PgStores;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply, everything inside is `Arc`-backed) for each request.
#[derive(Clone)]
pub struct AppState {
    /// VIP eligibility engine
    pub engine: EligibilityEngine,
    /// Stock-aware cart service
    pub cart: CartService,
}

impl AppState {
    /// Create application state from already-built services.
    #[must_use]
    pub const fn new(engine: EligibilityEngine, cart: CartService) -> Self {
        Self { engine, cart }
    }

    /// Connect to `PostgreSQL`, ensure the schema, and wire the production
    /// services.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the database cannot be reached or the
    /// schema bootstrap fails.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let pool =
            storefront_postgres::connect(&config.postgres.url, config.postgres.max_connections)
                .await?;
        storefront_postgres::ensure_schema(&pool, &config.vip.code_prefix).await?;
        let stores = PgStores::new(pool);

        let clock = Arc::new(SystemClock);
        let selection = Arc::new(StableSampling::new(
            config.vip.selection_ratio,
            config.vip.cooldown_months,
        ));

        let engine = EligibilityEngine::new(
            stores.orders,
            stores.coupons,
            clock.clone(),
            selection,
            Arc::new(RandomCodes),
            config.vip.clone(),
        );
        let cart = CartService::new(stores.products, stores.carts, clock);

        Ok(Self::new(engine, cart))
    }
}
