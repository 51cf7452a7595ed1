//! Menu catalog endpoints (public, read-only)

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use shared::models::{Category, MenuItem, MenuItemDetail};

use super::ApiResult;
use super::extract::{PathParam, QueryParams};
use crate::db::menu;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MenuItemQuery {
    pub category: Option<i64>,
}

/// GET /api/categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(Json(menu::list_categories(&state.pool).await?))
}

/// GET /api/menu-items?category=<id>
pub async fn list_menu_items(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<MenuItemQuery>,
) -> ApiResult<Vec<MenuItem>> {
    Ok(Json(menu::list_menu_items(&state.pool, query.category).await?))
}

/// GET /api/menu-items/{id}
pub async fn get_menu_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<MenuItemDetail> {
    Ok(Json(menu::get_menu_item(&state.pool, id).await?))
}
