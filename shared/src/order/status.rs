//! Order lifecycle state machine
//!
//! Two independent axes: [`OrderStatus`] (kitchen/fulfilment progress) and
//! [`PaymentStatus`]. They only meet in two places: a successful payment
//! moves a pending order to processing, and a refund requires the order to be
//! cancelled.

use crate::error::{AppError, AppResult, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fulfilment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

/// What is asking for a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Staff action through the admin API
    Admin,
    /// The payment for this order settled
    PaymentSucceeded,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled orders never change again
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `trigger` may move an order from `self` to `to`
    pub fn can_transition(self, to: OrderStatus, trigger: Trigger) -> bool {
        use OrderStatus::*;
        match (self, to, trigger) {
            (Pending, Processing, Trigger::Admin | Trigger::PaymentSucceeded) => true,
            (Pending, Cancelled, Trigger::Admin) => true,
            (Processing, Completed, Trigger::Admin) => true,
            (Processing, Cancelled, Trigger::Admin) => true,
            _ => false,
        }
    }

    /// Guarded transition; returns the new status or an `OrderInvalidTransition` error
    pub fn transition(self, to: OrderStatus, trigger: Trigger) -> AppResult<OrderStatus> {
        if self.can_transition(to, trigger) {
            Ok(to)
        } else {
            Err(AppError::invalid_transition(self.as_str(), to.as_str()))
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::validation(format!("Unknown order status: {other}"))
                .with_detail("status", other)),
        }
    }
}

/// Settlement status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Whether the payment axis may move from `self` to `to` given the order status
    pub fn can_transition(self, to: PaymentStatus, order_status: OrderStatus) -> bool {
        use PaymentStatus::*;
        match (self, to) {
            (Pending, Paid) | (Pending, Failed) => true,
            (Paid, Refunded) => order_status == OrderStatus::Cancelled,
            _ => false,
        }
    }

    pub fn transition(
        self,
        to: PaymentStatus,
        order_status: OrderStatus,
    ) -> AppResult<PaymentStatus> {
        if self.can_transition(to, order_status) {
            return Ok(to);
        }
        let message = if matches!((self, to), (Self::Paid, Self::Refunded)) {
            "Refunds require the order to be cancelled first".to_string()
        } else {
            format!("Cannot move payment from {} to {}", self, to)
        };
        Err(AppError::with_message(ErrorCode::PaymentInvalidTransition, message)
            .with_detail("from", self.as_str())
            .with_detail("to", to.as_str())
            .with_detail("orderStatus", order_status.as_str()))
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(AppError::validation(format!("Unknown payment status: {other}"))
                .with_detail("paymentStatus", other)),
        }
    }
}
