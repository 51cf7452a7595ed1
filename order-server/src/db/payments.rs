//! Payment queries
//!
//! At most one payment per order (UNIQUE order_id), including declined
//! attempts. A successful charge marks the order paid and moves it from
//! pending to processing in the same transaction; it never completes the order.

use shared::error::{AppError, ErrorCode};
use shared::models::{Payment, PaymentCreate, PaymentReceipt};
use shared::money::{from_cents, to_cents};
use shared::order::{OrderStatus, PaymentStatus, Trigger};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::orders::{self, ORDER_COLUMNS, OrderRow};
use crate::error::ServiceResult;
use crate::services::{ChargeOutcome, ChargeRequest, PaymentGateway};

const PAYMENT_COLUMNS: &str = "id, order_id, amount, payment_method, status, transaction_id, payment_details, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    order_id: i64,
    amount: i64,
    payment_method: String,
    status: String,
    transaction_id: Option<String>,
    payment_details: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl PaymentRow {
    fn into_payment(self) -> ServiceResult<Payment> {
        let payment_details = self
            .payment_details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(Payment {
            id: self.id,
            order_id: self.order_id,
            amount: from_cents(self.amount),
            payment_method: self.payment_method,
            status: self.status.parse::<PaymentStatus>()?,
            transaction_id: self.transaction_id,
            payment_details,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) async fn find_by_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> ServiceResult<Option<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?");
    sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .map(PaymentRow::into_payment)
        .transpose()
}

/// Mirror an admin payment status change onto the payment record, if any
pub(crate) async fn sync_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: PaymentStatus,
    now: i64,
) -> ServiceResult<()> {
    sqlx::query("UPDATE payments SET status = ?, updated_at = ? WHERE order_id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Settle an order through the gateway and record the outcome
pub async fn process_payment(
    pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    input: &PaymentCreate,
) -> ServiceResult<PaymentReceipt> {
    let payment_method = input.payment_method.trim();
    if payment_method.is_empty() {
        return Err(AppError::required("paymentMethod").into());
    }
    if input.amount <= rust_decimal::Decimal::ZERO {
        return Err(AppError::validation("amount must be greater than 0")
            .with_detail("amount", input.amount.to_string())
            .into());
    }
    if input.amount.normalize().scale() > 2 {
        return Err(AppError::validation("amount has more than two decimal places")
            .with_detail("amount", input.amount.to_string())
            .into());
    }
    let amount = to_cents(input.amount)?;
    let details = input
        .payment_details
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let mut tx = super::begin_write(pool).await?;
    let order = orders::find_order(&mut tx, input.order_id).await?;

    if order.payment_status == PaymentStatus::Paid {
        return Err(AppError::new(ErrorCode::OrderAlreadyPaid)
            .with_detail("orderId", order.id)
            .into());
    }
    if let Some(existing) = find_by_order(&mut tx, order.id).await? {
        return Err(AppError::new(ErrorCode::PaymentAlreadyRecorded)
            .with_detail("orderId", order.id)
            .with_detail("paymentStatus", existing.status.as_str())
            .into());
    }
    order
        .status
        .transition(OrderStatus::Processing, Trigger::PaymentSucceeded)?;

    let required = to_cents(order.total)?;
    if amount < required {
        return Err(AppError::new(ErrorCode::PaymentInsufficientAmount)
            .with_detail("required", order.total.to_string())
            .with_detail("provided", from_cents(amount).to_string())
            .into());
    }

    let outcome = gateway
        .charge(&ChargeRequest {
            order_id: order.id,
            order_number: order.order_number.clone(),
            amount: from_cents(amount),
            payment_method: payment_method.to_string(),
        })
        .await
        .map_err(|e| AppError::with_message(ErrorCode::PaymentFailed, e.to_string()))?;

    let (payment_status, transaction_id) = match &outcome {
        ChargeOutcome::Approved { transaction_id } => {
            (PaymentStatus::Paid, Some(transaction_id.clone()))
        }
        ChargeOutcome::Declined { reason } => {
            tracing::warn!(order_id = order.id, reason = %reason, "Payment declined");
            (PaymentStatus::Failed, None)
        }
    };
    order.payment_status.transition(payment_status, order.status)?;
    let now = now_millis();

    let sql = format!(
        "INSERT INTO payments (order_id, amount, payment_method, status, transaction_id, payment_details, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {PAYMENT_COLUMNS}"
    );
    let payment = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(order.id)
        .bind(amount)
        .bind(payment_method)
        .bind(payment_status.as_str())
        .bind(&transaction_id)
        .bind(&details)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?
        .into_payment()?;

    let next_status = match payment_status {
        PaymentStatus::Paid => OrderStatus::Processing,
        _ => order.status,
    };
    let sql = format!(
        "UPDATE orders SET payment_status = ?, status = ?, updated_at = ? WHERE id = ? RETURNING {ORDER_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(payment_status.as_str())
        .bind(next_status.as_str())
        .bind(now)
        .bind(order.id)
        .fetch_one(&mut *tx)
        .await?
        .into_order()?;

    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        payment_id = payment.id,
        status = %payment.status,
        amount = %payment.amount,
        "Payment recorded"
    );

    Ok(PaymentReceipt {
        payment,
        order: updated,
    })
}
