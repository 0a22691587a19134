pub mod accounts;
pub mod backup;
pub mod database;
pub mod directory;
pub mod expenses;
pub mod inventory;
pub mod memory;
pub mod metrics;
pub mod reports;
pub mod store;

pub use accounts::AccountAggregator;
pub use backup::BackupService;
pub use database::Database;
pub use directory::Directory;
pub use expenses::ExpenseLedger;
pub use inventory::{InventoryEngine, InvoiceDetails};
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use reports::MonthCloseReporter;
pub use store::LedgerStore;
