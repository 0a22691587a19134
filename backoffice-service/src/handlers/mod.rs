pub mod accounts;
pub mod backup;
pub mod expenses;
pub mod health;
pub mod inventory;
pub mod item;
pub mod party;

pub use health::{health_check, metrics_endpoint, readiness_check};
