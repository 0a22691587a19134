//! Persistence seam for the ledger.
//!
//! Every mutating method is one atomic unit: either all of its stock, balance
//! and record writes land or none do.

use crate::ledger::{InvoiceDraft, MonthClose, ReturnCreditPolicy};
use crate::models::{
    AccountType, CoaAccount, DateRange, Expense, ExpenseFilter, ExpenseInput, ExpenseUpdate,
    InventoryTransaction, Item, ItemInput, NewAccount, Party, PartyAccount, PartyInput,
    PartyKind, RestoreCounts, Snapshot, StockRecord, TransactionFilter,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Party directory
    async fn create_party(&self, input: PartyInput) -> Result<Party, AppError>;
    async fn update_party(&self, party_id: Uuid, input: PartyInput) -> Result<Party, AppError>;
    async fn get_party(&self, party_id: Uuid) -> Result<Option<Party>, AppError>;
    async fn list_parties(&self, kind: PartyKind) -> Result<Vec<Party>, AppError>;
    async fn list_salesman_customers(&self, salesman_id: Uuid) -> Result<Vec<Party>, AppError>;

    // Item catalog and stock
    async fn create_item(&self, input: ItemInput) -> Result<Item, AppError>;
    async fn update_item(&self, item_id: Uuid, input: ItemInput) -> Result<Item, AppError>;
    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, AppError>;
    async fn list_items(&self, company_id: Option<Uuid>) -> Result<Vec<Item>, AppError>;
    async fn get_stock(&self, item_id: Uuid) -> Result<Option<StockRecord>, AppError>;

    // Inventory transactions
    async fn post_inventory_transaction(
        &self,
        draft: InvoiceDraft,
        policy: ReturnCreditPolicy,
    ) -> Result<InventoryTransaction, AppError>;
    async fn get_inventory_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<InventoryTransaction>, AppError>;
    /// Newest business date first, then highest transaction number.
    async fn list_inventory_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<InventoryTransaction>, AppError>;

    // Party accounts
    /// Zeroed counters for a party that has never been posted against.
    async fn get_party_account(&self, party_id: Uuid) -> Result<PartyAccount, AppError>;
    async fn receive_cash(
        &self,
        party_id: Uuid,
        expected_kind: PartyKind,
        amount: Decimal,
    ) -> Result<PartyAccount, AppError>;
    async fn add_credit(
        &self,
        party_id: Uuid,
        amount: Decimal,
        message: String,
    ) -> Result<PartyAccount, AppError>;

    // Chart of accounts
    async fn create_account(&self, input: NewAccount) -> Result<CoaAccount, AppError>;
    async fn rename_account(&self, account_id: Uuid, ac_name: String)
        -> Result<CoaAccount, AppError>;
    async fn get_account(&self, account_id: Uuid) -> Result<Option<CoaAccount>, AppError>;
    async fn list_accounts(&self, ac_type: Option<AccountType>)
        -> Result<Vec<CoaAccount>, AppError>;

    // Expenses
    async fn create_expense(&self, input: ExpenseInput) -> Result<Expense, AppError>;
    async fn update_expense(
        &self,
        expense_id: Uuid,
        update: ExpenseUpdate,
    ) -> Result<Expense, AppError>;
    /// Newest expense date first.
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError>;

    // Reporting
    async fn month_close(&self, range: DateRange) -> Result<MonthClose, AppError>;

    // Backup
    async fn export_snapshot(&self) -> Result<Snapshot, AppError>;
    /// Replace the whole state with `snapshot`.
    async fn import_snapshot(&self, snapshot: Snapshot) -> Result<RestoreCounts, AppError>;
}
