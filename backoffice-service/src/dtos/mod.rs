pub mod accounts;
pub mod de;
pub mod expenses;
pub mod inventory;
pub mod item;
pub mod party;

use crate::ledger::error::LedgerError;
use crate::models::DateRange;
use anyhow::anyhow;
use chrono::NaiveDate;
use serde::Deserialize;
use service_core::error::AppError;

pub use accounts::{
    AddCreditRequest, CompanyAccountData, CompanyCashRequest, CompanyQuery, CustomerAccountData,
    CustomerCashRequest, CustomerQuery,
};
pub use expenses::{
    AccountRequest, ExpenseAccountResponse, ExpenseRequest, ExpenseResponse,
    ExpenseUpdateRequest, MonthCloseQuery, MonthCloseResponse,
};
pub use inventory::{
    InvoiceResponse, ItemInvoicesQuery, PartyInvoicesQuery, PurchaseInvoiceRequest,
    SaleReturnRequest, SalesInvoiceRequest, SalesmanInvoicesQuery,
};
pub use item::{ItemQuery, ItemRequest, ItemResponse, StockQuery, StockResponse};
pub use party::{PartyRequest, PartyResponse};

/// `withDate` / `dateFrom` / `dateTo` as sent by the console on every listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilter {
    #[serde(default, deserialize_with = "de::flag")]
    pub with_date: bool,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date_to: Option<NaiveDate>,
}

impl DateFilter {
    /// `None` unless `withDate` is set, in which case both bounds are required.
    pub fn range(&self) -> Result<Option<DateRange>, AppError> {
        if !self.with_date {
            return Ok(None);
        }
        required_range(self.date_from, self.date_to).map(Some)
    }
}

pub fn required_range(
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Result<DateRange, AppError> {
    match (date_from, date_to) {
        (Some(from), Some(to)) => Ok(DateRange::new(from, to)?),
        _ => Err(LedgerError::Validation("dateFrom and dateTo are required".to_string()).into()),
    }
}

/// Missing request field, reported the way the console shows it.
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::BadRequest(anyhow!("{} is required", field)))
}
