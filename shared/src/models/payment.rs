//! Payment Model

use crate::order::PaymentStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payment record; at most one per order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: Decimal,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    /// Opaque gateway data
    pub payment_details: Option<Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Process payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreate {
    pub order_id: i64,
    #[serde(default)]
    pub payment_method: String,
    pub amount: Decimal,
    pub payment_details: Option<Value>,
}

/// Result of processing a payment: the record and the updated order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub order: crate::models::Order,
}
