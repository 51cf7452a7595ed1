//! Table lookup for scanned QR codes

use axum::Json;
use axum::extract::State;
use shared::models::DiningTable;

use super::ApiResult;
use super::extract::PathParam;
use crate::db::tables;
use crate::state::AppState;

/// GET /api/tables/{id}
pub async fn get_table(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<DiningTable> {
    Ok(Json(tables::get_table(&state.pool, id).await?))
}
