//! Pure ledger rules shared by every store backend.

pub mod bounds;
pub mod balance;
pub mod close;
pub mod error;
pub mod posting;
pub mod stock;

use crate::models::{AccountType, CoaAccount, Party, PartyKind};
use error::LedgerError;
use rust_decimal::Decimal;

pub use balance::{EntryDraft, ReturnCreditPolicy};
pub use close::MonthClose;
pub use posting::{DraftLine, InvoiceDraft, PaymentTerms, PostingPlan, PriceUpdate, Settlement};
pub use stock::StockDelta;

/// Fail unless `party` is of the `expected` kind.
pub fn ensure_kind(party: &Party, expected: PartyKind) -> Result<(), LedgerError> {
    if party.kind() != expected {
        return Err(LedgerError::Validation(format!(
            "Party {} is a {}, expected a {}",
            party.party_id,
            party.kind(),
            expected
        )));
    }
    Ok(())
}

pub fn ensure_expense_account(account: &CoaAccount) -> Result<(), LedgerError> {
    if account.ac_type != AccountType::Expense {
        return Err(LedgerError::Validation(format!(
            "Account {} is not an expense account",
            account.account_id
        )));
    }
    Ok(())
}

/// Expense amount and narration rules for create and update.
pub fn check_expense(amount: Decimal, narration: &str) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "Expense amount must be greater than zero, got {}",
            amount
        )));
    }
    bounds::check_amount("amount", amount)?;
    if narration.trim().is_empty() {
        return Err(LedgerError::Validation("narration is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactInfo, PartyProfile};
    use chrono::Utc;
    use uuid::Uuid;

    fn party(profile: PartyProfile) -> Party {
        Party {
            party_id: Uuid::new_v4(),
            contact: ContactInfo {
                name_full: "Acme".to_string(),
                ..ContactInfo::default()
            },
            profile,
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        }
    }

    #[test]
    fn kind_mismatch_is_validation_error() {
        let company = party(PartyProfile::Company);
        assert!(ensure_kind(&company, PartyKind::Company).is_ok());
        assert!(matches!(
            ensure_kind(&company, PartyKind::Customer),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn expense_rules() {
        assert!(check_expense(Decimal::from(30), "Fuel").is_ok());
        assert!(matches!(
            check_expense(Decimal::ZERO, "Fuel"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            check_expense(Decimal::from(30), " "),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            check_expense("30.00001".parse().unwrap(), "Fuel"),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            check_expense(Decimal::MAX, "Fuel"),
            Err(LedgerError::Validation(_))
        ));

        let account = CoaAccount {
            account_id: Uuid::new_v4(),
            ac_name: "Cash".to_string(),
            ac_type: AccountType::Cash,
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        };
        assert!(ensure_expense_account(&account).is_err());
    }
}
