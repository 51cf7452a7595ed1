//! Order lifecycle
//!
//! Status enums and the guarded transition functions shared by checkout,
//! payment and the admin API.

pub mod status;

pub use status::{OrderStatus, PaymentStatus, Trigger};
