//! Money helpers
//!
//! Amounts are stored as integer cents and handled as `Decimal` with two
//! decimal places everywhere else. Floating point never touches money.

use crate::error::{AppError, AppResult, ErrorCode};
use rust_decimal::prelude::*;

/// Rounding precision for monetary values
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum accepted unit price or payment amount (1,000,000.00)
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;

/// Convert stored cents to a two-place decimal
#[inline]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Convert a decimal amount to cents, rounding half away from zero
pub fn to_cents(amount: Decimal) -> AppResult<i64> {
    amount
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|c| c.to_i64())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::ValueOutOfRange, "Amount is out of range")
                .with_detail("amount", amount.to_string())
        })
}

/// Validate a menu price and convert it to cents
pub fn price_to_cents(price: Decimal) -> AppResult<i64> {
    let cents = to_cents(price)?;
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(AppError::new(ErrorCode::MenuItemInvalidPrice)
            .with_detail("price", price.to_string()));
    }
    Ok(cents)
}

/// Line total in cents: unit price × quantity
pub fn line_total_cents(price_cents: i64, quantity: i64) -> AppResult<i64> {
    price_cents
        .checked_mul(quantity)
        .ok_or_else(|| AppError::with_message(ErrorCode::ValueOutOfRange, "Line total overflow"))
}

/// Sum of line totals in cents
pub fn sum_lines<I>(lines: I) -> AppResult<i64>
where
    I: IntoIterator<Item = (i64, i64)>,
{
    lines.into_iter().try_fold(0i64, |acc, (price, qty)| {
        let line = line_total_cents(price, qty)?;
        acc.checked_add(line)
            .ok_or_else(|| AppError::with_message(ErrorCode::ValueOutOfRange, "Total overflow"))
    })
}
