//! Whole-state backup and restore.
//!
//! An archive is the pretty-printed JSON form of [`Snapshot`]. Restoring
//! replaces every party, item, transaction, balance, account and expense.

use crate::models::{RestoreCounts, Snapshot};
use crate::services::metrics::record_posting;
use crate::services::store::LedgerStore;
use anyhow::anyhow;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct BackupService {
    store: Arc<dyn LedgerStore>,
}

impl BackupService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn export(&self) -> Result<Vec<u8>, AppError> {
        let snapshot = self.store.export_snapshot().await?;
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| AppError::InternalError(anyhow!("Failed to encode backup: {}", e)))?;
        info!(
            parties = snapshot.parties.len(),
            transactions = snapshot.transactions.len(),
            size = bytes.len(),
            "Backup exported"
        );
        Ok(bytes)
    }

    #[instrument(skip(self, archive), fields(size = archive.len()))]
    pub async fn import(&self, archive: &[u8]) -> Result<RestoreCounts, AppError> {
        let snapshot: Snapshot = serde_json::from_slice(archive).map_err(|e| {
            warn!(error = %e, "Rejected unreadable backup");
            AppError::BadRequest(anyhow!("Backup file is not a valid archive: {}", e))
        })?;

        let result = self.store.import_snapshot(snapshot).await;
        record_posting("restore", &result);
        let counts = result?;
        info!(?counts, "Backup restored");
        Ok(counts)
    }
}
