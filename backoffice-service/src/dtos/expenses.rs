use super::{de, required};
use crate::ledger::MonthClose;
use crate::models::{AccountType, CoaAccount, Expense, ExpenseInput, ExpenseUpdate, NewAccount};
use anyhow::anyhow;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

pub fn parse_account_type(value: &str) -> Result<AccountType, AppError> {
    value
        .parse::<i16>()
        .ok()
        .and_then(AccountType::from_code)
        .or_else(|| match value.to_lowercase().as_str() {
            "cash" => Some(AccountType::Cash),
            "credit" => Some(AccountType::Credit),
            "sale" => Some(AccountType::Sale),
            "sale_return" => Some(AccountType::SaleReturn),
            "expense" => Some(AccountType::Expense),
            _ => None,
        })
        .ok_or_else(|| AppError::BadRequest(anyhow!("Invalid acType: {}", value)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequest {
    #[serde(default)]
    pub ac_name: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub ac_type: Option<String>,
}

impl AccountRequest {
    /// A missing `acType` opens an expense account.
    pub fn into_account(self) -> Result<NewAccount, AppError> {
        let ac_type = match self.ac_type.as_deref() {
            Some(value) => parse_account_type(value)?,
            None => AccountType::Expense,
        };
        Ok(NewAccount {
            ac_name: self.ac_name,
            ac_type,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    #[serde(
        default,
        rename = "acID",
        alias = "accountID",
        deserialize_with = "de::opt_uuid"
    )]
    pub account_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub narration: String,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date: Option<NaiveDate>,
}

impl ExpenseRequest {
    pub fn into_input(self) -> Result<ExpenseInput, AppError> {
        Ok(ExpenseInput {
            account_id: required(self.account_id, "acID")?,
            amount: required(self.amount, "amount")?,
            narration: self.narration,
            expense_date: self.date,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ExpenseUpdateRequest {
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub narration: String,
    #[serde(
        default,
        rename = "acID",
        alias = "accountID",
        deserialize_with = "de::opt_uuid"
    )]
    pub account_id: Option<Uuid>,
}

impl ExpenseUpdateRequest {
    pub fn into_update(self) -> Result<ExpenseUpdate, AppError> {
        Ok(ExpenseUpdate {
            amount: required(self.amount, "amount")?,
            narration: self.narration,
            account_id: self.account_id,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCloseQuery {
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseAccountResponse {
    pub id: Uuid,
    pub ac_name: String,
    pub ac_type: AccountType,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CoaAccount> for ExpenseAccountResponse {
    fn from(account: CoaAccount) -> Self {
        Self {
            id: account.account_id,
            ac_name: account.ac_name,
            ac_type: account.ac_type,
            created_at: account.created_utc.to_rfc3339(),
            updated_at: account.updated_utc.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: Uuid,
    #[serde(rename = "accountID")]
    pub account_id: Uuid,
    pub narration: String,
    pub credit: Decimal,
    pub expense_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.expense_id,
            account_id: expense.account_id,
            narration: expense.narration,
            credit: expense.credit,
            expense_date: expense.expense_date,
            created_at: expense.created_utc.to_rfc3339(),
            updated_at: expense.updated_utc.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCloseResponse {
    pub total_purchases: Decimal,
    pub total_sales: Decimal,
    pub total_sales_returns: Decimal,
    pub total_expenses: Decimal,
    pub profit: Decimal,
}

impl From<MonthClose> for MonthCloseResponse {
    fn from(close: MonthClose) -> Self {
        Self {
            total_purchases: close.total_purchases,
            total_sales: close.total_sales,
            total_sales_returns: close.total_sales_returns,
            total_expenses: close.total_expenses,
            profit: close.profit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_defaults_to_expense() {
        let req: AccountRequest = serde_json::from_str(r#"{"acName": "Rent"}"#).unwrap();
        assert_eq!(req.into_account().unwrap().ac_type, AccountType::Expense);

        let req: AccountRequest =
            serde_json::from_str(r#"{"acName": "Till", "acType": "1"}"#).unwrap();
        assert_eq!(req.into_account().unwrap().ac_type, AccountType::Cash);

        assert!(parse_account_type("bogus").is_err());
    }

    #[test]
    fn expense_accepts_either_account_key() {
        let id = Uuid::new_v4();
        for key in ["acID", "accountID"] {
            let req: ExpenseRequest = serde_json::from_str(&format!(
                r#"{{"{key}": "{id}", "amount": "30", "narration": "Fuel", "date": ""}}"#
            ))
            .unwrap();
            let input = req.into_input().unwrap();
            assert_eq!(input.account_id, id);
            assert_eq!(input.amount, Decimal::from(30));
            assert_eq!(input.expense_date, None);
        }
    }

    #[test]
    fn close_response_carries_profit() {
        let close = MonthClose {
            total_purchases: Decimal::from(400),
            total_sales: Decimal::from(1000),
            total_sales_returns: Decimal::from(50),
            total_expenses: Decimal::from(100),
        };
        let json = serde_json::to_value(MonthCloseResponse::from(close)).unwrap();
        assert_eq!(json["profit"], "500");
        assert_eq!(json["totalSalesReturns"], "50");
    }
}
