//! Cart endpoints

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::AppError;
use shared::models::{Cart, CartItem, CartItemAdd, CartItemUpdate, GUEST_SESSION};

use super::ApiResult;
use super::extract::{JsonBody, PathParam, QueryParams};
use crate::db::cart;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub table: Option<i64>,
    pub session: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClearCartQuery {
    pub id: Option<i64>,
}

/// GET /api/cart?table=<id>&session=<id>
///
/// Creates the cart on first read. Storage failures degrade to an empty
/// snapshot rather than an error.
pub async fn get_cart(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CartQuery>,
) -> ApiResult<Cart> {
    let table_id = query.table.ok_or_else(|| AppError::required("table"))?;
    let session = query
        .session
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(GUEST_SESSION);

    Ok(Json(cart::read_cart_or_empty(&state.pool, table_id, session).await))
}

/// DELETE /api/cart?id=<cartId>
pub async fn clear_cart(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ClearCartQuery>,
) -> ApiResult<Value> {
    let cart_id = query.id.ok_or_else(|| AppError::required("id"))?;
    cart::clear_cart(&state.pool, cart_id).await?;
    Ok(Json(json!({ "message": "Cart cleared", "cartId": cart_id })))
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CartItemAdd>,
) -> Result<(StatusCode, Json<CartItem>), AppError> {
    let item = cart::add_item(&state.pool, &req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/cart/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<CartItemUpdate>,
) -> ApiResult<CartItem> {
    Ok(Json(cart::update_item_quantity(&state.pool, id, req.quantity).await?))
}

/// DELETE /api/cart/items/{id}
pub async fn remove_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Value> {
    cart::remove_item(&state.pool, id).await?;
    Ok(Json(json!({ "message": "Item removed", "id": id })))
}
