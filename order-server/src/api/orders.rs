//! Checkout and order lookup

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use shared::error::AppError;
use shared::models::{OrderCreate, OrderDetail};

use super::ApiResult;
use super::extract::{JsonBody, PathParam};
use crate::auth::CurrentUser;
use crate::db::orders;
use crate::state::AppState;

/// POST /api/orders
///
/// Guests may check out; a signed-in customer is recorded on the order.
pub async fn create_order(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    JsonBody(req): JsonBody<OrderCreate>,
) -> Result<(StatusCode, Json<OrderDetail>), AppError> {
    let order = orders::create_order(&state.pool, &req, user.map(|u| u.id)).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<OrderDetail> {
    Ok(Json(orders::get_order(&state.pool, id).await?))
}
