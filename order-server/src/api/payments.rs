//! Payment endpoint

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use shared::error::AppError;
use shared::models::{PaymentCreate, PaymentReceipt};

use super::extract::JsonBody;
use crate::db::payments;
use crate::state::AppState;

/// POST /api/payments
pub async fn process_payment(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PaymentCreate>,
) -> Result<(StatusCode, Json<PaymentReceipt>), AppError> {
    let receipt = payments::process_payment(&state.pool, state.gateway.as_ref(), &req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
