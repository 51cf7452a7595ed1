//! Error codes and the application error type
//!
//! [`ErrorCode`] is a flat numeric table whose thousands digit names the
//! domain. [`AppError`] carries a code, a message and optional details, and
//! renders itself as the JSON error body with the code's HTTP status.
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::validation("Quantity must be at least 1")
//!     .with_detail("field", "quantity");
//! assert_eq!(err.code, ErrorCode::ValidationFailed);
//! assert_eq!(err.http_status().as_u16(), 400);
//! ```

mod codes;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
