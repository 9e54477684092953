//! Caller identity extractor.
//!
//! Authentication is out of scope for this backend: callers present an
//! already-resolved user id in the `X-User-Id` header and the excluded
//! auth layer is expected to have validated it upstream. The extractor
//! only parses and threads the opaque identity through to the services.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use parley_types::id::UserId;

use super::super::error::AppError;

/// Header carrying the caller's resolved user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, as an opaque user id.
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub UserId);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing X-User-Id header".to_string()))?;

        let value = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("malformed X-User-Id header".to_string()))?;

        let user_id: UserId = value
            .parse()
            .map_err(|_| AppError::Unauthorized("X-User-Id is not a valid id".to_string()))?;

        Ok(CallerIdentity(user_id))
    }
}
