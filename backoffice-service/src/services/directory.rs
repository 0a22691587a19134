//! Party directory and item catalog.

use crate::ledger::bounds::check_amount;
use crate::ledger::ensure_kind;
use crate::ledger::error::LedgerError;
use crate::models::{Item, ItemInput, Party, PartyInput, PartyKind, PartyProfile, StockRecord};
use crate::services::store::LedgerStore;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

fn check_party(input: &PartyInput) -> Result<(), LedgerError> {
    if input.contact.name_full.trim().is_empty() {
        return Err(LedgerError::Validation("nameFull is required".to_string()));
    }
    if let PartyProfile::Customer { area_name, .. } = &input.profile {
        if area_name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "areaName is required for customers".to_string(),
            ));
        }
    }
    Ok(())
}

fn check_item(input: &ItemInput) -> Result<(), LedgerError> {
    if input.name_full.trim().is_empty() {
        return Err(LedgerError::Validation("nameFull is required".to_string()));
    }
    if input.purchase_price < Decimal::ZERO || input.sale_price < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "Item prices must not be negative".to_string(),
        ));
    }
    check_amount("purchasePrice", input.purchase_price)?;
    check_amount("salePrice", input.sale_price)?;
    if input.units_in_carton < 1 {
        return Err(LedgerError::Validation(
            "unitsInCarton must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn LedgerStore>,
}

impl Directory {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn create_party(&self, input: PartyInput) -> Result<Party, AppError> {
        check_party(&input)?;
        self.store.create_party(input).await
    }

    pub async fn update_party(&self, party_id: Uuid, input: PartyInput) -> Result<Party, AppError> {
        check_party(&input)?;
        self.store.update_party(party_id, input).await
    }

    pub async fn get_party(&self, party_id: Uuid) -> Result<Party, AppError> {
        self.store
            .get_party(party_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Party", party_id).into())
    }

    /// Like [`Directory::get_party`], but a party of another kind is a
    /// validation error.
    pub async fn get_party_of_kind(
        &self,
        party_id: Uuid,
        kind: PartyKind,
    ) -> Result<Party, AppError> {
        let party = self.get_party(party_id).await?;
        ensure_kind(&party, kind)?;
        Ok(party)
    }

    pub async fn list_parties(&self, kind: PartyKind) -> Result<Vec<Party>, AppError> {
        self.store.list_parties(kind).await
    }

    #[instrument(skip(self), fields(salesman_id = %salesman_id))]
    pub async fn list_salesman_customers(&self, salesman_id: Uuid) -> Result<Vec<Party>, AppError> {
        self.get_party_of_kind(salesman_id, PartyKind::Salesman)
            .await?;
        self.store.list_salesman_customers(salesman_id).await
    }

    pub async fn create_item(&self, input: ItemInput) -> Result<Item, AppError> {
        check_item(&input)?;
        self.store.create_item(input).await
    }

    pub async fn update_item(&self, item_id: Uuid, input: ItemInput) -> Result<Item, AppError> {
        check_item(&input)?;
        self.store.update_item(item_id, input).await
    }

    pub async fn get_item(&self, item_id: Uuid) -> Result<Item, AppError> {
        self.store
            .get_item(item_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Item", item_id).into())
    }

    pub async fn list_items(&self, company_id: Option<Uuid>) -> Result<Vec<Item>, AppError> {
        self.store.list_items(company_id).await
    }

    pub async fn get_stock(&self, item_id: Uuid) -> Result<StockRecord, AppError> {
        self.store
            .get_stock(item_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Item", item_id).into())
    }
}
