//! Running account data per customer and company.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Running counters for one party, updated with every posting that touches it.
///
/// Customers use the sales fields, companies the purchase field; cash and
/// credit are shared.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PartyBalance {
    pub party_id: Uuid,
    pub total_sales: Decimal,
    pub total_sale_returns: Decimal,
    pub total_purchases: Decimal,
    pub total_cash: Decimal,
    pub total_credit: Decimal,
    pub updated_utc: DateTime<Utc>,
}

impl PartyBalance {
    /// Zeroed counters stamped with `opened_utc`.
    pub fn new(party_id: Uuid, opened_utc: DateTime<Utc>) -> Self {
        Self {
            party_id,
            total_sales: Decimal::ZERO,
            total_sale_returns: Decimal::ZERO,
            total_purchases: Decimal::ZERO,
            total_cash: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            updated_utc: opened_utc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    SaleCredit,
    PurchaseCredit,
    CashReceived,
    CreditAdded,
    ReturnCredit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaleCredit => "sale_credit",
            Self::PurchaseCredit => "purchase_credit",
            Self::CashReceived => "cash_received",
            Self::CreditAdded => "credit_added",
            Self::ReturnCredit => "return_credit",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Narration line in a party's account history.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PartyEntry {
    pub entry_id: Uuid,
    pub party_id: Uuid,
    pub kind: EntryKind,
    pub narration: String,
    pub credit: Decimal,
    pub transaction_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
}

/// Counters plus narration history, newest entry first.
#[derive(Debug, Clone, PartialEq)]
pub struct PartyAccount {
    pub balance: PartyBalance,
    pub entries: Vec<PartyEntry>,
}

/// Newest first, ties broken by id so repeated reads are identical.
pub fn sort_entries_newest_first(entries: &mut [PartyEntry]) {
    entries.sort_by(|a, b| {
        b.created_utc
            .cmp(&a.created_utc)
            .then(b.entry_id.cmp(&a.entry_id))
    });
}
