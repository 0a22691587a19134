//! Stock ledger arithmetic.

use super::bounds;
use super::error::LedgerError;
use crate::models::StockRecord;
use chrono::Utc;
use rust_decimal::Decimal;

/// Signed change to an item's on-hand quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockDelta {
    pub com_qty: Decimal,
    pub bonus_qty: Decimal,
}

impl StockDelta {
    pub fn inbound(com_qty: Decimal, bonus_qty: Decimal) -> Self {
        Self { com_qty, bonus_qty }
    }

    pub fn outbound(com_qty: Decimal, bonus_qty: Decimal) -> Self {
        Self {
            com_qty: -com_qty,
            bonus_qty: -bonus_qty,
        }
    }
}

impl StockRecord {
    /// Apply `delta`, or leave the record untouched if either quantity would
    /// go below zero.
    pub fn apply(&mut self, delta: StockDelta) -> Result<(), LedgerError> {
        let com_qty = bounds::add(self.com_qty, delta.com_qty, "comQty on hand")?;
        let bonus_qty = bounds::add(self.bonus_qty, delta.bonus_qty, "bonusQty on hand")?;

        if com_qty < Decimal::ZERO || bonus_qty < Decimal::ZERO {
            return Err(LedgerError::InsufficientStock {
                item_id: self.item_id,
                requested_com: (-delta.com_qty).max(Decimal::ZERO),
                requested_bonus: (-delta.bonus_qty).max(Decimal::ZERO),
                available_com: self.com_qty,
                available_bonus: self.bonus_qty,
            });
        }

        self.com_qty = com_qty;
        self.bonus_qty = bonus_qty;
        self.updated_utc = Utc::now();
        Ok(())
    }
}

/// Quantities are whole units, never negative.
pub fn validate_quantity(field: &str, qty: Decimal) -> Result<(), LedgerError> {
    if qty < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "{} must not be negative, got {}",
            field, qty
        )));
    }
    if !qty.fract().is_zero() {
        return Err(LedgerError::Validation(format!(
            "{} must be a whole number, got {}",
            field, qty
        )));
    }
    bounds::check_amount(field, qty)
}
