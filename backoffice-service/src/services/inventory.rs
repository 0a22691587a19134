//! Purchase invoices, sales invoices and sale returns.

use crate::ledger::error::LedgerError;
use crate::ledger::{ensure_kind, InvoiceDraft, ReturnCreditPolicy};
use crate::models::{
    DateRange, InventoryTransaction, Party, PartyKind, TransactionFilter, TransactionType,
};
use crate::services::metrics::record_posting;
use crate::services::store::LedgerStore;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A posted transaction with its party and salesman resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDetails {
    pub transaction: InventoryTransaction,
    pub party: Option<Party>,
    pub salesman: Option<Party>,
}

#[derive(Clone)]
pub struct InventoryEngine {
    store: Arc<dyn LedgerStore>,
    policy: ReturnCreditPolicy,
}

impl InventoryEngine {
    pub fn new(store: Arc<dyn LedgerStore>, policy: ReturnCreditPolicy) -> Self {
        Self { store, policy }
    }

    pub fn return_credit_policy(&self) -> ReturnCreditPolicy {
        self.policy
    }

    /// Validate and post `draft` as one atomic unit.
    #[instrument(
        skip(self, draft),
        fields(transaction_type = %draft.transaction_type, party_id = %draft.party_id)
    )]
    pub async fn post(&self, draft: InvoiceDraft) -> Result<InvoiceDetails, AppError> {
        let kind = draft.transaction_type.as_str();
        let result = match draft.validate() {
            Ok(()) => {
                self.store
                    .post_inventory_transaction(draft, self.policy)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        record_posting(kind, &result);

        let transaction = result.map_err(|e| {
            warn!(error = %e, "Inventory posting rejected");
            e
        })?;
        info!(
            transaction_no = transaction.transaction_no,
            amount = %transaction.transaction_amount,
            credit = %transaction.credit_amount,
            "Posted {}",
            kind
        );

        let mut parties = HashMap::new();
        self.resolve(transaction, &mut parties).await
    }

    /// Fetch one transaction, hiding those whose type is not in `accepted`.
    pub async fn get_invoice(
        &self,
        transaction_id: Uuid,
        accepted: &[TransactionType],
    ) -> Result<InvoiceDetails, AppError> {
        let transaction = self
            .store
            .get_inventory_transaction(transaction_id)
            .await?
            .filter(|t| accepted.contains(&t.transaction_type))
            .ok_or_else(|| LedgerError::not_found("Invoice", transaction_id))?;
        let mut parties = HashMap::new();
        self.resolve(transaction, &mut parties).await
    }

    pub async fn list_invoices(
        &self,
        transaction_type: TransactionType,
    ) -> Result<Vec<InvoiceDetails>, AppError> {
        self.list(TransactionFilter::of_type(transaction_type)).await
    }

    pub async fn list_by_item(
        &self,
        item_id: Uuid,
        transaction_type: Option<TransactionType>,
        range: Option<DateRange>,
    ) -> Result<Vec<InvoiceDetails>, AppError> {
        self.store
            .get_item(item_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Item", item_id))?;
        self.list(TransactionFilter {
            transaction_type,
            item_id: Some(item_id),
            range,
            ..TransactionFilter::default()
        })
        .await
    }

    /// Sales invoices and returns for one customer.
    pub async fn list_by_customer(
        &self,
        customer_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<InvoiceDetails>, AppError> {
        self.require(customer_id, PartyKind::Customer).await?;
        self.list(TransactionFilter {
            party_id: Some(customer_id),
            range,
            ..TransactionFilter::default()
        })
        .await
    }

    pub async fn list_by_company(
        &self,
        company_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<InvoiceDetails>, AppError> {
        self.require(company_id, PartyKind::Company).await?;
        self.list(TransactionFilter {
            party_id: Some(company_id),
            range,
            ..TransactionFilter::default()
        })
        .await
    }

    /// Sales invoices booked by a salesman, optionally only those containing
    /// `product_id`.
    pub async fn list_by_salesman(
        &self,
        salesman_id: Uuid,
        range: Option<DateRange>,
        product_id: Option<Uuid>,
    ) -> Result<Vec<InvoiceDetails>, AppError> {
        self.require(salesman_id, PartyKind::Salesman).await?;
        self.list(TransactionFilter {
            transaction_type: Some(TransactionType::SalesInvoice),
            salesman_id: Some(salesman_id),
            item_id: product_id,
            range,
            ..TransactionFilter::default()
        })
        .await
    }

    async fn require(&self, party_id: Uuid, kind: PartyKind) -> Result<Party, AppError> {
        let party = self
            .store
            .get_party(party_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Party", party_id))?;
        ensure_kind(&party, kind)?;
        Ok(party)
    }

    async fn list(&self, filter: TransactionFilter) -> Result<Vec<InvoiceDetails>, AppError> {
        let transactions = self.store.list_inventory_transactions(&filter).await?;
        let mut parties = HashMap::new();
        let mut invoices = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            invoices.push(self.resolve(transaction, &mut parties).await?);
        }
        Ok(invoices)
    }

    async fn resolve(
        &self,
        transaction: InventoryTransaction,
        parties: &mut HashMap<Uuid, Option<Party>>,
    ) -> Result<InvoiceDetails, AppError> {
        let party = self.lookup(transaction.party_id, parties).await?;
        let salesman = match transaction.salesman_id {
            Some(id) => self.lookup(id, parties).await?,
            None => None,
        };
        Ok(InvoiceDetails {
            transaction,
            party,
            salesman,
        })
    }

    async fn lookup(
        &self,
        party_id: Uuid,
        parties: &mut HashMap<Uuid, Option<Party>>,
    ) -> Result<Option<Party>, AppError> {
        if let Some(cached) = parties.get(&party_id) {
            return Ok(cached.clone());
        }
        let party = self.store.get_party(party_id).await?;
        parties.insert(party_id, party.clone());
        Ok(party)
    }
}
