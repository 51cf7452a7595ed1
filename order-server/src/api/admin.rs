//! Staff endpoints
//!
//! Mounted under `/api/admin` behind `require_admin`, which leaves the
//! resolved [`CurrentUser`] in the request extensions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use shared::error::AppError;
use shared::models::{
    DiningTable, DiningTableCreate, MenuItem, MenuItemCreate, MenuItemUpdate, Order, OrderPage,
    OrderStatusUpdate, PaymentStatusUpdate, User,
};
use shared::order::OrderStatus;

use super::ApiResult;
use super::extract::{JsonBody, PathParam, QueryParams};
use crate::auth::CurrentUser;
use crate::db::{menu, orders, tables, users};
use crate::state::AppState;

const DEFAULT_PER_PAGE: i64 = 20;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/orders/{id}/payment-status", patch(update_payment_status))
        .route("/menu-items", post(create_menu_item))
        .route("/menu-items/{id}", patch(update_menu_item))
        .route("/tables", get(list_tables).post(create_table))
        .route("/users", get(list_users))
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/admin/orders?status=&page=&per_page=
pub async fn list_orders(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OrderListQuery>,
) -> ApiResult<OrderPage> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    let page = orders::list_orders(
        &state.pool,
        status,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(DEFAULT_PER_PAGE),
    )
    .await?;
    Ok(Json(page))
}

/// PATCH /api/admin/orders/{id}/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<OrderStatusUpdate>,
) -> ApiResult<Order> {
    tracing::debug!(
        order_id = id,
        admin_id = admin.id,
        to = %req.status,
        "Admin status change requested"
    );
    Ok(Json(orders::update_status(&state.pool, id, req.status).await?))
}

/// PATCH /api/admin/orders/{id}/payment-status
pub async fn update_payment_status(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<PaymentStatusUpdate>,
) -> ApiResult<Order> {
    tracing::debug!(
        order_id = id,
        admin_id = admin.id,
        to = %req.payment_status,
        "Admin payment status change requested"
    );
    Ok(Json(orders::update_payment_status(&state.pool, id, req.payment_status).await?))
}

/// POST /api/admin/menu-items
pub async fn create_menu_item(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<MenuItemCreate>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    let item = menu::create_menu_item(&state.pool, &req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/admin/menu-items/{id}
pub async fn update_menu_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<MenuItemUpdate>,
) -> ApiResult<MenuItem> {
    Ok(Json(menu::update_menu_item(&state.pool, id, &req).await?))
}

/// GET /api/admin/tables
pub async fn list_tables(State(state): State<AppState>) -> ApiResult<Vec<DiningTable>> {
    Ok(Json(tables::list_tables(&state.pool).await?))
}

/// POST /api/admin/tables
pub async fn create_table(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<DiningTableCreate>,
) -> Result<(StatusCode, Json<DiningTable>), AppError> {
    let table = tables::create_table(&state.pool, &req.name, &state.config.public_base_url).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(Json(users::list_users(&state.pool).await?))
}
