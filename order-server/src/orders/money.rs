//! Money calculation using rust_decimal
//!
//! Prices are stored as REAL; every computation goes through `Decimal` and is
//! rounded back to 2 decimal places (half away from zero). Arithmetic is
//! checked: an overflow is an error, never a panic.

use super::error::{OrderError, OrderResult};
use rust_decimal::prelude::*;

const DECIMAL_PLACES: u32 = 2;

/// Maximum quantity per cart line
pub const MAX_QUANTITY: i64 = 9999;
/// Maximum catalog unit price, in currency unit
pub const MAX_PRICE: f64 = 1_000_000_000_000.0;

/// Orderable catalog price: finite, non-negative, at most [`MAX_PRICE`]
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && (0.0..=MAX_PRICE).contains(&price)
}

/// NaN and infinities have no decimal value
pub fn to_decimal(value: f64) -> OrderResult<Decimal> {
    if !value.is_finite() {
        return Err(OrderError::InvalidArgument(format!(
            "amount must be a finite number, got {value}"
        )));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        OrderError::InvalidArgument(format!("amount {value} is out of range"))
    })
}

/// Convert back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// unit price × quantity, rounded to 2 decimal places
pub fn line_subtotal(unit_price: f64, quantity: i64) -> OrderResult<Decimal> {
    to_decimal(unit_price)?
        .checked_mul(Decimal::from(quantity))
        .map(|v| v.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| {
            OrderError::InvalidArgument(format!(
                "subtotal overflows for price {unit_price} × quantity {quantity}"
            ))
        })
}

/// Σ subtotals
pub fn order_total<I>(subtotals: I) -> OrderResult<f64>
where
    I: IntoIterator<Item = Decimal>,
{
    subtotals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .map(to_f64)
        .ok_or_else(|| OrderError::InvalidArgument("order total overflows".into()))
}
