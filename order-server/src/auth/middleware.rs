//! Auth middleware and cookie helpers
//!
//! The token travels in the `auth_token` cookie (HTTP-only, SameSite=Strict).
//! An `Authorization: Bearer <token>` header is also accepted for API clients.

use axum::extract::{Request, State};
use axum::http::{Extensions, HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use shared::error::{AppError, ErrorCode};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::auth::{CurrentUser, JwtError};
use crate::state::AppState;

/// Cookie that carries the auth token
pub const AUTH_COOKIE: &str = "auth_token";

/// Build the auth cookie for a freshly issued token
pub fn auth_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .build()
}

/// Expire the auth cookie on the client
pub fn clear_auth_cookie(cookies: &Cookies) {
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
}

/// Token from the auth cookie, falling back to a bearer header
pub(crate) fn request_token(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    if let Some(cookie) = extensions
        .get::<Cookies>()
        .and_then(|cookies| cookies.get(AUTH_COOKIE))
    {
        let value = cookie.value();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Validate a token and map failures onto auth error codes
pub(crate) fn authenticate(state: &AppState, token: &str) -> Result<CurrentUser, AppError> {
    match state.jwt.validate_token(token) {
        Ok(claims) => CurrentUser::try_from(claims),
        Err(e) => {
            tracing::warn!(error = %e, "Auth token rejected");
            match e {
                JwtError::ExpiredToken => Err(AppError::new(ErrorCode::TokenExpired)),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Admin gate
///
/// | Case | Status |
/// |------|--------|
/// | no token | 401 NotAuthenticated |
/// | bad or expired token | 401 TokenInvalid / TokenExpired |
/// | authenticated non-admin | 403 AdminRequired |
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = request_token(req.headers(), req.extensions()) else {
        return Err(AppError::not_authenticated());
    };
    let user = authenticate(&state, &token)?;

    if !user.is_admin() {
        tracing::warn!(
            user_id = user.id,
            uri = %req.uri(),
            "Admin route denied"
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(
            request_token(&headers, &Extensions::new()).as_deref(),
            Some("abc.def")
        );
    }

    #[test]
    fn test_missing_or_malformed_header() {
        let mut headers = HeaderMap::new();
        assert!(request_token(&headers, &Extensions::new()).is_none());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(request_token(&headers, &Extensions::new()).is_none());
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie("tok".into(), false);
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
    }
}
