//! Payment gateway seam
//!
//! Settlement is behind [`PaymentGateway`] so a real provider can replace the
//! [`SimulatedGateway`] without touching the order flow.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// What the gateway is asked to settle
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_id: i64,
    pub order_number: String,
    pub amount: Decimal,
    pub payment_method: String,
}

/// Gateway verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved { transaction_id: String },
    Declined { reason: String },
}

/// Gateway could not produce a verdict
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError>;
}

/// Always approves, issuing `trx-<millis>-<n>` transaction ids
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, GatewayError> {
        let transaction_id = shared::util::transaction_id();
        tracing::info!(
            order_id = request.order_id,
            order_number = %request.order_number,
            amount = %request.amount,
            method = %request.payment_method,
            transaction_id = %transaction_id,
            "Simulated payment approved"
        );
        Ok(ChargeOutcome::Approved { transaction_id })
    }
}
