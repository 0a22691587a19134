//! Inventory transactions: purchase invoices, sales invoices and sale returns.

use super::{DateRange, PartyKind};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    PurchaseInvoice = 1,
    SalesInvoice = 2,
    SaleReturn = 3,
}

impl TransactionType {
    pub const ALL: [TransactionType; 3] = [
        Self::PurchaseInvoice,
        Self::SalesInvoice,
        Self::SaleReturn,
    ];

    pub fn from_code(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::PurchaseInvoice),
            2 => Some(Self::SalesInvoice),
            3 => Some(Self::SaleReturn),
            _ => None,
        }
    }

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseInvoice => "purchase_invoice",
            Self::SalesInvoice => "sales_invoice",
            Self::SaleReturn => "sale_return",
        }
    }

    /// Kind of party the transaction is posted against.
    pub fn party_kind(self) -> PartyKind {
        match self {
            Self::PurchaseInvoice => PartyKind::Company,
            Self::SalesInvoice | Self::SaleReturn => PartyKind::Customer,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an invoice is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    OnCash,
    OnCredit,
    Partial,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnCash => "ON_CASH",
            Self::OnCredit => "ON_CREDIT",
            Self::Partial => "PARTIAL",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ON_CASH" => Ok(Self::OnCash),
            "ON_CREDIT" => Ok(Self::OnCredit),
            "PARTIAL" => Ok(Self::Partial),
            _ => Err(format!("Invalid payment type: {}", s)),
        }
    }
}

/// One posted invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    pub item_id: Uuid,
    pub unit_price: Decimal,
    pub com_qty: Decimal,
    pub bonus_qty: Decimal,
    pub line_total: Decimal,
}

/// Posted inventory transaction. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub transaction_id: Uuid,
    pub transaction_type: TransactionType,
    pub transaction_no: i64,
    pub transaction_date: NaiveDate,
    pub party_id: Uuid,
    pub salesman_id: Option<Uuid>,
    pub payment_type: Option<PaymentType>,
    pub transaction_amount: Decimal,
    pub cash_amount: Decimal,
    pub credit_amount: Decimal,
    pub lines: Vec<TransactionLine>,
    pub created_utc: DateTime<Utc>,
}

impl InventoryTransaction {
    pub fn contains_item(&self, item_id: Uuid) -> bool {
        self.lines.iter().any(|line| line.item_id == item_id)
    }
}

/// Query over posted transactions. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub party_id: Option<Uuid>,
    pub salesman_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub range: Option<DateRange>,
}

impl TransactionFilter {
    pub fn of_type(transaction_type: TransactionType) -> Self {
        Self {
            transaction_type: Some(transaction_type),
            ..Self::default()
        }
    }

    pub fn matches(&self, tx: &InventoryTransaction) -> bool {
        self.transaction_type.map_or(true, |t| t == tx.transaction_type)
            && self.party_id.map_or(true, |id| id == tx.party_id)
            && self.salesman_id.map_or(true, |id| Some(id) == tx.salesman_id)
            && self.item_id.map_or(true, |id| tx.contains_item(id))
            && self
                .range
                .as_ref()
                .map_or(true, |range| range.contains(tx.transaction_date))
    }
}

/// Listing order: newest business date first, then highest number.
pub fn sort_newest_first(transactions: &mut [InventoryTransaction]) {
    transactions.sort_by(|a, b| {
        b.transaction_date
            .cmp(&a.transaction_date)
            .then(b.transaction_no.cmp(&a.transaction_no))
            .then(b.created_utc.cmp(&a.created_utc))
    });
}
