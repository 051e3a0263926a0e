//! Custom Axum extractors.
//!
//! The only extractor here is the authenticated-customer stand-in:
//! authentication proper (sessions, tokens) is handled by upstream
//! middleware outside this service, which forwards the verified identity in
//! the `X-Customer-Id` header.

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use storefront_core::types::CustomerId;
use uuid::Uuid;

/// Header the upstream auth layer forwards the verified customer id in
pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";

/// The authenticated customer on whose behalf the request runs.
///
/// # Example
///
/// ```ignore
/// async fn handler(SessionCustomer(customer_id): SessionCustomer) -> ... {
///     // customer_id is a validated CustomerId
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SessionCustomer(pub CustomerId);

#[async_trait]
impl<S> FromRequestParts<S> for SessionCustomer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CUSTOMER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing customer identity"))?;

        let uuid = Uuid::parse_str(raw)
            .map_err(|_| AppError::unauthorized("malformed customer identity"))?;
        Ok(Self(CustomerId::from_uuid(uuid)))
    }
}
