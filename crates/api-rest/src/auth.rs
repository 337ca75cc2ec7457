//! Bearer-token authentication extractor.

use crate::error::ApiError;
use crate::AppState;
use api_shared::auth::{bearer_token, AUTHORIZATION_HEADER};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use intake_core::Principal;

/// The caller resolved from `Authorization: Bearer <token>`.
///
/// Handlers take this as an argument; a missing, unknown or expired token rejects the request
/// with 401 before the handler runs.
#[derive(Clone, Debug)]
pub struct Authenticated(pub Principal);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthenticated)?;

        let principal = state.accounts.authenticate(token).map_err(|e| {
            tracing::warn!(path = %parts.uri.path(), "rejected bearer token");
            ApiError::from(e)
        })?;

        Ok(Authenticated(principal))
    }
}
