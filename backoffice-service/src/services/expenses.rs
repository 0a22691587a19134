//! Chart of accounts and the single-sided expense ledger.

use crate::ledger::error::LedgerError;
use crate::models::{
    AccountType, CoaAccount, DateRange, Expense, ExpenseFilter, ExpenseInput, ExpenseUpdate,
    NewAccount,
};
use crate::services::metrics::record_posting;
use crate::services::store::LedgerStore;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

fn check_account_name(ac_name: &str) -> Result<String, LedgerError> {
    let name = ac_name.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation("acName is required".to_string()));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct ExpenseLedger {
    store: Arc<dyn LedgerStore>,
}

impl ExpenseLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Only expense accounts can be opened through the API.
    #[instrument(skip(self, input), fields(ac_type = %input.ac_type))]
    pub async fn create_account(&self, input: NewAccount) -> Result<CoaAccount, AppError> {
        if input.ac_type != AccountType::Expense {
            return Err(LedgerError::Validation(format!(
                "Only expense accounts can be created, got {}",
                input.ac_type
            ))
            .into());
        }
        let ac_name = check_account_name(&input.ac_name)?;
        self.store
            .create_account(NewAccount {
                ac_name,
                ac_type: AccountType::Expense,
            })
            .await
    }

    pub async fn rename_account(
        &self,
        account_id: Uuid,
        ac_name: &str,
    ) -> Result<CoaAccount, AppError> {
        let ac_name = check_account_name(ac_name)?;
        self.store.rename_account(account_id, ac_name).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<CoaAccount>, AppError> {
        self.store.list_accounts(Some(AccountType::Expense)).await
    }

    #[instrument(skip(self, input), fields(account_id = %input.account_id, amount = %input.amount))]
    pub async fn create_expense(&self, input: ExpenseInput) -> Result<Expense, AppError> {
        let result = self.store.create_expense(input).await;
        record_posting("expense", &result);
        let expense = result?;
        info!(expense_id = %expense.expense_id, "Expense posted");
        Ok(expense)
    }

    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        update: ExpenseUpdate,
    ) -> Result<Expense, AppError> {
        self.store.update_expense(expense_id, update).await
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, AppError> {
        self.store.list_expenses(&ExpenseFilter::default()).await
    }

    pub async fn list_by_account(
        &self,
        account_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<Expense>, AppError> {
        self.store
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Account", account_id))?;
        self.store
            .list_expenses(&ExpenseFilter {
                account_id: Some(account_id),
                range,
            })
            .await
    }

    pub async fn monthly_total(&self, range: DateRange) -> Result<Decimal, AppError> {
        let expenses = self
            .store
            .list_expenses(&ExpenseFilter {
                account_id: None,
                range: Some(range),
            })
            .await?;
        Ok(expenses.iter().map(|e| e.credit).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;
    use chrono::NaiveDate;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn ledger() -> ExpenseLedger {
        ExpenseLedger::new(Arc::new(MemoryStore::new()))
    }

    async fn account(ledger: &ExpenseLedger, name: &str) -> CoaAccount {
        ledger
            .create_account(NewAccount {
                ac_name: name.to_string(),
                ac_type: AccountType::Expense,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn only_expense_accounts_are_created() {
        let ledger = ledger();
        let err = ledger
            .create_account(NewAccount {
                ac_name: "Till".to_string(),
                ac_type: AccountType::Cash,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = ledger
            .create_account(NewAccount {
                ac_name: " ".to_string(),
                ac_type: AccountType::Expense,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let rent = account(&ledger, "Rent").await;
        let renamed = ledger
            .rename_account(rent.account_id, "Shop rent")
            .await
            .unwrap();
        assert_eq!(renamed.ac_name, "Shop rent");
        assert_eq!(ledger.list_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expenses_are_listed_and_totalled_by_date() {
        let ledger = ledger();
        let rent = account(&ledger, "Rent").await;
        let fuel = account(&ledger, "Fuel").await;
        for (acct, amount, d) in [(&rent, "1000", 1), (&fuel, "50", 15), (&fuel, "70", 31)] {
            ledger
                .create_expense(ExpenseInput {
                    account_id: acct.account_id,
                    amount: dec(amount),
                    narration: "monthly".to_string(),
                    expense_date: Some(day(d)),
                })
                .await
                .unwrap();
        }

        let first_half = DateRange::new(day(1), day(15)).unwrap();
        assert_eq!(ledger.monthly_total(first_half).await.unwrap(), dec("1050"));

        let fuel_only = ledger.list_by_account(fuel.account_id, None).await.unwrap();
        let dates: Vec<NaiveDate> = fuel_only.iter().map(|e| e.expense_date).collect();
        assert_eq!(dates, vec![day(31), day(15)]);

        assert_eq!(ledger.list_expenses().await.unwrap().len(), 3);
        assert_eq!(
            ledger
                .list_by_account(Uuid::new_v4(), None)
                .await
                .unwrap_err()
                .code(),
            "NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn update_keeps_account() {
        let ledger = ledger();
        let rent = account(&ledger, "Rent").await;
        let fuel = account(&ledger, "Fuel").await;
        let expense = ledger
            .create_expense(ExpenseInput {
                account_id: rent.account_id,
                amount: dec("100"),
                narration: "June".to_string(),
                expense_date: None,
            })
            .await
            .unwrap();

        let err = ledger
            .update_expense(
                expense.expense_id,
                ExpenseUpdate {
                    amount: dec("120"),
                    narration: "June".to_string(),
                    account_id: Some(fuel.account_id),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let updated = ledger
            .update_expense(
                expense.expense_id,
                ExpenseUpdate {
                    amount: dec("120"),
                    narration: "June rent".to_string(),
                    account_id: Some(rent.account_id),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.credit, dec("120"));
        assert_eq!(updated.narration, "June rent");

        let err = ledger
            .create_expense(ExpenseInput {
                account_id: rent.account_id,
                amount: dec("0"),
                narration: "nothing".to_string(),
                expense_date: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");
    }
}
