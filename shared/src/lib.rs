//! Shared types for the ordering backend
//!
//! Domain models, error codes, the order lifecycle state machine, money
//! helpers and small utilities used by the server and its tests.

pub mod error;
pub mod models;
pub mod money;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};
