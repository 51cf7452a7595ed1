//! Request extractors for the authenticated caller

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use shared::error::AppError;

use crate::auth::CurrentUser;
use crate::auth::middleware::{authenticate, request_token};
use crate::state::AppState;

/// Required identity: rejects with 401 when the token is missing or invalid
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by require_admin
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let Some(token) = request_token(&parts.headers, &parts.extensions) else {
            tracing::debug!(uri = %parts.uri, "No auth token on request");
            return Err(AppError::not_authenticated());
        };

        let user = authenticate(state, &token)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Optional identity: guests and bad tokens both resolve to `None`
impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let user = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .ok();
        Ok(user)
    }
}
