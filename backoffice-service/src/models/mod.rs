//! Domain models for backoffice-service.

mod account;
mod balance;
mod item;
mod party;
mod period;
mod snapshot;
mod transaction;

pub use account::{
    AccountType, CoaAccount, Expense, ExpenseFilter, ExpenseInput, ExpenseUpdate, NewAccount,
};
pub use balance::{
    sort_entries_newest_first, EntryKind, PartyAccount, PartyBalance, PartyEntry,
};
pub use item::{Item, ItemInput, StockRecord};
pub use party::{ContactInfo, Party, PartyInput, PartyKind, PartyProfile};
pub use period::DateRange;
pub use snapshot::{RestoreCounts, Snapshot, TransactionCounter, SNAPSHOT_FORMAT_VERSION};
pub use transaction::{
    sort_newest_first, InventoryTransaction, PaymentType, TransactionFilter, TransactionLine,
    TransactionType,
};
