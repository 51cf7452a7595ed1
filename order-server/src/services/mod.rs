//! External collaborators

pub mod payment;

pub use payment::{ChargeOutcome, ChargeRequest, GatewayError, PaymentGateway, SimulatedGateway};
