//! Account endpoints: register, login, logout, me

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{LoginRequest, RegisterRequest, Role, User};
use tower_cookies::Cookies;

use super::ApiResult;
use super::extract::JsonBody;
use crate::auth::password::{MIN_PASSWORD_LEN, hash_password, verify_password};
use crate::auth::{CurrentUser, auth_cookie, clear_auth_cookie, is_valid_email};
use crate::db::users;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::required("email"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::new(ErrorCode::EmailInvalid).with_detail("email", email));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort)
            .with_detail("minLength", MIN_PASSWORD_LEN as u64));
    }

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hash error: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    let user = users::create_user(&state.pool, &email, &hash, &name, Role::Customer).await?;
    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<User> {
    let email = req.email.trim().to_lowercase();
    let Some(account) = users::find_by_email(&state.pool, &email).await? else {
        return Err(AppError::invalid_credentials());
    };
    if !verify_password(&req.password, &account.password_hash) {
        tracing::warn!(user_id = account.user.id, "Login failed: bad password");
        return Err(AppError::invalid_credentials());
    }

    let token = state.jwt.generate_token(&account.user).map_err(|e| {
        tracing::error!("JWT generation error: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    cookies.add(auth_cookie(token, !state.config.is_development()));

    tracing::info!(user_id = account.user.id, role = %account.user.role, "User logged in");
    Ok(Json(account.user))
}

/// POST /api/auth/logout
pub async fn logout(cookies: Cookies) -> ApiResult<Value> {
    clear_auth_cookie(&cookies);
    Ok(Json(json!({ "message": "Logged out" })))
}

/// GET /api/auth/me
///
/// A missing, invalid or orphaned token clears the cookie and returns 401.
pub async fn me(
    State(state): State<AppState>,
    cookies: Cookies,
    current: Result<CurrentUser, AppError>,
) -> ApiResult<User> {
    let current = current.inspect_err(|_| clear_auth_cookie(&cookies))?;

    match users::find_by_id(&state.pool, current.id).await {
        Ok(user) => Ok(Json(user)),
        Err(e) if e.code() == Some(ErrorCode::UserNotFound) => {
            clear_auth_cookie(&cookies);
            Err(AppError::not_authenticated())
        }
        Err(e) => Err(e.into()),
    }
}
