//! Chart of accounts and expense entries.

use super::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// COA account categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Cash = 1,
    Credit = 2,
    Sale = 3,
    SaleReturn = 4,
    Expense = 5,
}

impl AccountType {
    pub fn from_code(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Cash),
            2 => Some(Self::Credit),
            3 => Some(Self::Sale),
            4 => Some(Self::SaleReturn),
            5 => Some(Self::Expense),
            _ => None,
        }
    }

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Credit => "credit",
            Self::Sale => "sale",
            Self::SaleReturn => "sale_return",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CoaAccount {
    pub account_id: Uuid,
    pub ac_name: String,
    pub ac_type: AccountType,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a COA account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub ac_name: String,
    pub ac_type: AccountType,
}

/// Single-sided expense posting against an expense account.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: Uuid,
    pub account_id: Uuid,
    pub narration: String,
    pub credit: Decimal,
    pub expense_date: NaiveDate,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseInput {
    pub account_id: Uuid,
    pub amount: Decimal,
    pub narration: String,
    pub expense_date: Option<NaiveDate>,
}

/// Amount and narration are the only mutable fields; `account_id`, when
/// supplied, must match the stored account.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseUpdate {
    pub amount: Decimal,
    pub narration: String,
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub account_id: Option<Uuid>,
    pub range: Option<DateRange>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        self.account_id.map_or(true, |id| id == expense.account_id)
            && self
                .range
                .as_ref()
                .map_or(true, |range| range.contains(expense.expense_date))
    }
}
