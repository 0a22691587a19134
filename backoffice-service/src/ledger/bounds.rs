//! Bounds for stored money and quantity values.
//!
//! Every amount column is `NUMERIC(20, 4)`, so both stores accept the same
//! range: at most four decimal places and a magnitude below 10^16.

use super::error::LedgerError;
use rust_decimal::Decimal;

pub const MAX_SCALE: u32 = 4;

const LIMIT_UNITS: i64 = 10_000_000_000_000_000;

/// Exclusive upper bound on the magnitude of any stored value.
pub fn limit() -> Decimal {
    Decimal::from(LIMIT_UNITS)
}

/// Reject client input that a store could not hold exactly.
pub fn check_amount(field: &str, value: Decimal) -> Result<(), LedgerError> {
    if value.normalize().scale() > MAX_SCALE {
        return Err(LedgerError::Validation(format!(
            "{} allows at most {} decimal places, got {}",
            field, MAX_SCALE, value
        )));
    }
    if value.abs() >= limit() {
        return Err(LedgerError::Validation(format!(
            "{} must be below {}, got {}",
            field,
            limit(),
            value
        )));
    }
    Ok(())
}

fn within_limit(value: Option<Decimal>, what: &str) -> Result<Decimal, LedgerError> {
    value
        .filter(|v| v.abs() < limit())
        .ok_or_else(|| LedgerError::InvalidAmount(format!("{} exceeds {}", what, limit())))
}

pub fn add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, LedgerError> {
    within_limit(a.checked_add(b), what)
}

pub fn sub(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, LedgerError> {
    within_limit(a.checked_sub(b), what)
}

pub fn mul(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, LedgerError> {
    within_limit(a.checked_mul(b), what)
}
