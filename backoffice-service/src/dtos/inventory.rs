use super::party::PartyResponse;
use super::{de, required, DateFilter};
use crate::ledger::{DraftLine, InvoiceDraft, PaymentTerms};
use crate::models::{PaymentType, TransactionLine, TransactionType};
use crate::services::InvoiceDetails;
use anyhow::anyhow;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    #[serde(default, rename = "itemID", deserialize_with = "de::opt_uuid")]
    pub item_id: Option<Uuid>,
    #[serde(
        default,
        alias = "price",
        alias = "purchasePrice",
        deserialize_with = "de::opt_decimal"
    )]
    pub unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub sale_price: Option<Decimal>,
    #[serde(default, deserialize_with = "de::decimal_or_zero")]
    pub com_qty: Decimal,
    #[serde(default, deserialize_with = "de::decimal_or_zero")]
    pub bonus_qty: Decimal,
}

impl LineItemRequest {
    fn into_line(self, keep_sale_price: bool) -> Result<DraftLine, AppError> {
        Ok(DraftLine {
            item_id: required(self.item_id, "itemID")?,
            unit_price: self.unit_price,
            com_qty: self.com_qty,
            bonus_qty: self.bonus_qty,
            sale_price: if keep_sale_price { self.sale_price } else { None },
        })
    }
}

fn into_lines(
    lines: Vec<LineItemRequest>,
    keep_sale_price: bool,
) -> Result<Vec<DraftLine>, AppError> {
    lines
        .into_iter()
        .map(|line| line.into_line(keep_sale_price))
        .collect()
}

fn payment_terms(
    payment_type: Option<String>,
    cash_amount: Option<Decimal>,
) -> Result<PaymentTerms, AppError> {
    let payment_type: PaymentType = required(payment_type, "paymentType")?
        .parse()
        .map_err(|e: String| AppError::BadRequest(anyhow!(e)))?;
    Ok(PaymentTerms {
        payment_type,
        cash_amount,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInvoiceRequest {
    #[serde(default, rename = "companyID", deserialize_with = "de::opt_uuid")]
    pub company_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub cash_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
}

impl PurchaseInvoiceRequest {
    /// `today` stands in for a missing date.
    pub fn into_draft(self, today: NaiveDate) -> Result<InvoiceDraft, AppError> {
        Ok(InvoiceDraft {
            transaction_type: TransactionType::PurchaseInvoice,
            party_id: required(self.company_id, "companyID")?,
            salesman_id: None,
            transaction_date: self.date.unwrap_or(today),
            payment: Some(payment_terms(self.payment_type, self.cash_amount)?),
            lines: into_lines(self.line_items, true)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesInvoiceRequest {
    #[serde(default, rename = "customerID", deserialize_with = "de::opt_uuid")]
    pub customer_id: Option<Uuid>,
    #[serde(default, rename = "salesmanID", deserialize_with = "de::opt_uuid")]
    pub salesman_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub cash_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
}

impl SalesInvoiceRequest {
    pub fn into_draft(self) -> Result<InvoiceDraft, AppError> {
        Ok(InvoiceDraft {
            transaction_type: TransactionType::SalesInvoice,
            party_id: required(self.customer_id, "customerID")?,
            salesman_id: self.salesman_id,
            transaction_date: required(self.date, "date")?,
            payment: Some(payment_terms(self.payment_type, self.cash_amount)?),
            lines: into_lines(self.line_items, false)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReturnRequest {
    #[serde(default, rename = "customerID", deserialize_with = "de::opt_uuid")]
    pub customer_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
}

impl SaleReturnRequest {
    pub fn into_draft(self, today: NaiveDate) -> Result<InvoiceDraft, AppError> {
        Ok(InvoiceDraft {
            transaction_type: TransactionType::SaleReturn,
            party_id: required(self.customer_id, "customerID")?,
            salesman_id: None,
            transaction_date: self.date.unwrap_or(today),
            payment: None,
            lines: into_lines(self.line_items, false)?,
        })
    }
}

pub fn parse_invoice_type(value: &str) -> Result<TransactionType, AppError> {
    value
        .parse::<i16>()
        .ok()
        .and_then(TransactionType::from_code)
        .or_else(|| {
            TransactionType::ALL
                .into_iter()
                .find(|t| t.as_str().eq_ignore_ascii_case(value))
        })
        .ok_or_else(|| AppError::BadRequest(anyhow!("Invalid invoiceType: {}", value)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInvoicesQuery {
    #[serde(default, rename = "itemID", deserialize_with = "de::opt_uuid")]
    pub item_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub invoice_type: Option<String>,
    #[serde(flatten)]
    pub dates: DateFilter,
}

impl ItemInvoicesQuery {
    pub fn invoice_type(&self) -> Result<Option<TransactionType>, AppError> {
        self.invoice_type
            .as_deref()
            .map(parse_invoice_type)
            .transpose()
    }
}

#[derive(Debug, Deserialize)]
pub struct PartyInvoicesQuery {
    #[serde(default, rename = "customerID", deserialize_with = "de::opt_uuid")]
    pub customer_id: Option<Uuid>,
    #[serde(default, rename = "companyID", deserialize_with = "de::opt_uuid")]
    pub company_id: Option<Uuid>,
    #[serde(flatten)]
    pub dates: DateFilter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesmanInvoicesQuery {
    #[serde(default, rename = "salesmanID", deserialize_with = "de::opt_uuid")]
    pub salesman_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::flag")]
    pub with_product: bool,
    #[serde(default, rename = "productID", deserialize_with = "de::opt_uuid")]
    pub product_id: Option<Uuid>,
    #[serde(flatten)]
    pub dates: DateFilter,
}

impl SalesmanInvoicesQuery {
    /// Item filter, only when `withProduct` is set.
    pub fn product(&self) -> Result<Option<Uuid>, AppError> {
        if !self.with_product {
            return Ok(None);
        }
        required(self.product_id, "productID").map(Some)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineResponse {
    #[serde(rename = "itemID")]
    pub item_id: Uuid,
    pub unit_price: Decimal,
    pub com_qty: Decimal,
    pub bonus_qty: Decimal,
    pub line_total: Decimal,
}

impl From<TransactionLine> for InvoiceLineResponse {
    fn from(line: TransactionLine) -> Self {
        Self {
            item_id: line.item_id,
            unit_price: line.unit_price,
            com_qty: line.com_qty,
            bonus_qty: line.bonus_qty,
            line_total: line.line_total,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub transaction_no: i64,
    pub transaction_date: NaiveDate,
    #[serde(rename = "partyID")]
    pub party_id: Uuid,
    #[serde(rename = "salesmanID")]
    pub salesman_id: Option<Uuid>,
    pub payment_type: Option<PaymentType>,
    pub transaction_amount: Decimal,
    pub cash_amount: Decimal,
    pub credit_amount: Decimal,
    pub inventory_transaction_items: Vec<InvoiceLineResponse>,
    pub party: Option<PartyResponse>,
    pub salesman: Option<PartyResponse>,
    pub created_at: String,
}

impl From<InvoiceDetails> for InvoiceResponse {
    fn from(details: InvoiceDetails) -> Self {
        let tx = details.transaction;
        Self {
            id: tx.transaction_id,
            transaction_type: tx.transaction_type,
            transaction_no: tx.transaction_no,
            transaction_date: tx.transaction_date,
            party_id: tx.party_id,
            salesman_id: tx.salesman_id,
            payment_type: tx.payment_type,
            transaction_amount: tx.transaction_amount,
            cash_amount: tx.cash_amount,
            credit_amount: tx.credit_amount,
            inventory_transaction_items: tx.lines.into_iter().map(Into::into).collect(),
            party: details.party.map(Into::into),
            salesman: details.salesman.map(Into::into),
            created_at: tx.created_utc.to_rfc3339(),
        }
    }
}
