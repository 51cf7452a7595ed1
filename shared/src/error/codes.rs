//! Error code table
//!
//! One row per code: numeric value, HTTP status and default message. The
//! thousands digit is the domain (0 general, 1 auth, 2 permission, 3 cart,
//! 4 order, 5 payment, 6 menu, 7 table, 8 user, 9 system).

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! error_codes {
    ($( $(#[$attr:meta])* $name:ident = $code:literal => $status:ident, $message:literal; )*) => {
        /// Numeric error code, serialized as a bare u16 so clients can switch on it
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u16", try_from = "u16")]
        #[repr(u16)]
        pub enum ErrorCode {
            $( $(#[$attr])* $name = $code, )*
        }

        impl ErrorCode {
            /// Every code in declaration order
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$name),*];

            /// Developer-facing English message
            pub const fn message(&self) -> &'static str {
                match self {
                    $(ErrorCode::$name => $message,)*
                }
            }

            pub fn http_status(&self) -> StatusCode {
                match self {
                    $(ErrorCode::$name => StatusCode::$status,)*
                }
            }
        }

        impl TryFrom<u16> for ErrorCode {
            type Error = InvalidErrorCode;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $($code => Ok(ErrorCode::$name),)*
                    _ => Err(InvalidErrorCode(value)),
                }
            }
        }
    };
}

error_codes! {
    // General
    ValidationFailed = 2 => BAD_REQUEST, "Validation failed";
    /// Body, path or query could not be parsed at all
    InvalidRequest = 5 => BAD_REQUEST, "Malformed request";
    RequiredField = 7 => BAD_REQUEST, "Required field is missing";
    ValueOutOfRange = 8 => BAD_REQUEST, "Value is out of range";

    // Auth
    NotAuthenticated = 1001 => UNAUTHORIZED, "User is not authenticated";
    InvalidCredentials = 1002 => UNAUTHORIZED, "Invalid email or password";
    TokenExpired = 1003 => UNAUTHORIZED, "Authentication token has expired";
    TokenInvalid = 1004 => UNAUTHORIZED, "Authentication token is invalid";
    PasswordTooShort = 1008 => BAD_REQUEST, "Password must be at least 8 characters";

    // Permission
    AdminRequired = 2003 => FORBIDDEN, "Administrator role is required";

    // Cart
    CartNotFound = 3001 => NOT_FOUND, "Cart not found";
    CartItemNotFound = 3002 => NOT_FOUND, "Cart item not found";
    CartInvalidQuantity = 3003 => BAD_REQUEST, "Quantity must be between 1 and 999";

    // Order
    OrderNotFound = 4001 => NOT_FOUND, "Order not found";
    OrderAlreadyPaid = 4002 => CONFLICT, "Order has already been paid";
    OrderEmpty = 4007 => BAD_REQUEST, "Cart is empty";
    OrderInvalidTransition = 4008 => CONFLICT, "Order status transition is not allowed";
    OrderNumberExhausted = 4009 => INTERNAL_SERVER_ERROR, "Could not allocate an order number";

    // Payment
    /// The gateway errored; nothing was recorded
    PaymentFailed = 5001 => INTERNAL_SERVER_ERROR, "Payment processing failed";
    PaymentInsufficientAmount = 5002 => PAYMENT_REQUIRED, "Insufficient payment amount";
    /// A payment row (possibly a declined one) already exists for the order
    PaymentAlreadyRecorded = 5004 => CONFLICT, "A payment has already been recorded for this order";
    PaymentInvalidTransition = 5006 => CONFLICT, "Payment status transition is not allowed";

    // Menu
    MenuItemNotFound = 6001 => NOT_FOUND, "Menu item not found";
    MenuItemInvalidPrice = 6002 => BAD_REQUEST, "Menu item has invalid price";
    MenuItemUnavailable = 6003 => BAD_REQUEST, "Menu item is not available";
    CategoryNotFound = 6101 => NOT_FOUND, "Category not found";

    // Table
    TableNotFound = 7001 => NOT_FOUND, "Table not found";

    // User
    UserNotFound = 8001 => NOT_FOUND, "User not found";
    EmailAlreadyRegistered = 8002 => CONFLICT, "Email is already registered";
    EmailInvalid = 8003 => BAD_REQUEST, "Email address is invalid";

    // System
    InternalError = 9001 => INTERNAL_SERVER_ERROR, "Internal server error";
    DatabaseError = 9002 => INTERNAL_SERVER_ERROR, "Database error";
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// 9xxx codes: logged in full, answered with the generic message only
    #[inline]
    pub const fn is_system(&self) -> bool {
        self.code() >= 9000
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A u16 that names no [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_parse_back() {
        let mut seen = std::collections::HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.code()), "duplicate code {code}");
            assert_eq!(ErrorCode::try_from(code.code()), Ok(*code));
        }
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
    }

    #[test]
    fn test_statuses() {
        assert_eq!(ErrorCode::CartNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InvalidRequest.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::OrderAlreadyPaid.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::PaymentAlreadyRecorded.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AdminRequired.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::PaymentInsufficientAmount.http_status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ErrorCode::OrderNumberExhausted.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_system_range() {
        assert!(ErrorCode::DatabaseError.is_system());
        assert!(ErrorCode::InternalError.is_system());
        assert!(!ErrorCode::PaymentFailed.is_system());
        assert!(!ErrorCode::ValidationFailed.is_system());
    }

    #[test]
    fn test_serde_and_display() {
        assert_eq!(serde_json::to_string(&ErrorCode::OrderEmpty).unwrap(), "4007");
        let code: ErrorCode = serde_json::from_str("3003").unwrap();
        assert_eq!(code, ErrorCode::CartInvalidQuantity);
        assert!(serde_json::from_str::<ErrorCode>("4003").is_err());
        assert_eq!(ErrorCode::ValidationFailed.to_string(), "E0002");
    }
}
