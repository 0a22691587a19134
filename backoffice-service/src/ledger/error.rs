use rust_decimal::Decimal;
use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Rule violations raised by the pure ledger functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),

    #[error(
        "Insufficient stock for item {item_id}: requested {requested_com} (+{requested_bonus} bonus), available {available_com} (+{available_bonus} bonus)"
    )]
    InsufficientStock {
        item_id: Uuid,
        requested_com: Decimal,
        requested_bonus: Decimal,
        available_com: Decimal,
        available_bonus: Decimal,
    },

    #[error("{0}")]
    InvalidAmount(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = anyhow::anyhow!(err.to_string());
        match err {
            LedgerError::Validation(_) => AppError::BadRequest(message),
            LedgerError::InsufficientStock { .. } => AppError::InsufficientStock(message),
            LedgerError::InvalidAmount(_) => AppError::InvalidAmount(message),
            LedgerError::NotFound { .. } => AppError::NotFound(message),
        }
    }
}
