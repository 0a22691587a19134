//! Customer and company running accounts.

use crate::ledger::ensure_kind;
use crate::ledger::error::LedgerError;
use crate::models::{PartyAccount, PartyKind};
use crate::services::metrics::record_posting;
use crate::services::store::LedgerStore;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct AccountAggregator {
    store: Arc<dyn LedgerStore>,
}

impl AccountAggregator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Counters and narration history for a customer or company.
    pub async fn account_data(
        &self,
        party_id: Uuid,
        kind: PartyKind,
    ) -> Result<PartyAccount, AppError> {
        let party = self
            .store
            .get_party(party_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Party", party_id))?;
        ensure_kind(&party, kind)?;
        self.store.get_party_account(party_id).await
    }

    #[instrument(skip(self), fields(party_id = %party_id, kind = %kind, amount = %amount))]
    pub async fn receive_cash(
        &self,
        party_id: Uuid,
        kind: PartyKind,
        amount: Decimal,
    ) -> Result<PartyAccount, AppError> {
        let result = self.store.receive_cash(party_id, kind, amount).await;
        record_posting("receive_cash", &result);
        let account = result?;
        info!(
            outstanding = %account.balance.total_credit,
            "Cash received"
        );
        Ok(account)
    }

    #[instrument(skip(self, message), fields(customer_id = %customer_id, amount = %amount))]
    pub async fn add_credit(
        &self,
        customer_id: Uuid,
        amount: Decimal,
        message: String,
    ) -> Result<PartyAccount, AppError> {
        let result = self.store.add_credit(customer_id, amount, message).await;
        record_posting("add_credit", &result);
        let account = result?;
        info!(
            outstanding = %account.balance.total_credit,
            "Credit added"
        );
        Ok(account)
    }
}
