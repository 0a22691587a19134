use super::{de, required};
use crate::models::{EntryKind, PartyAccount, PartyEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    #[serde(default, rename = "customerID", deserialize_with = "de::opt_uuid")]
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CompanyQuery {
    #[serde(default, rename = "companyID", deserialize_with = "de::opt_uuid")]
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerCashRequest {
    #[serde(default, rename = "customerID", deserialize_with = "de::opt_uuid")]
    pub customer_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub amount: Option<Decimal>,
}

impl CustomerCashRequest {
    pub fn into_parts(self) -> Result<(Uuid, Decimal), AppError> {
        Ok((
            required(self.customer_id, "customerID")?,
            required(self.amount, "amount")?,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct CompanyCashRequest {
    #[serde(default, rename = "companyID", deserialize_with = "de::opt_uuid")]
    pub company_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub amount: Option<Decimal>,
}

impl CompanyCashRequest {
    pub fn into_parts(self) -> Result<(Uuid, Decimal), AppError> {
        Ok((
            required(self.company_id, "companyID")?,
            required(self.amount, "amount")?,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCreditRequest {
    #[serde(default, rename = "customerID", deserialize_with = "de::opt_uuid")]
    pub customer_id: Option<Uuid>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: Uuid,
    #[serde(rename = "partyID")]
    pub party_id: Uuid,
    pub kind: EntryKind,
    pub narration: String,
    pub credit: Decimal,
    #[serde(rename = "transactionID")]
    pub transaction_id: Option<Uuid>,
    pub created_at: String,
}

impl From<PartyEntry> for EntryResponse {
    fn from(entry: PartyEntry) -> Self {
        Self {
            id: entry.entry_id,
            party_id: entry.party_id,
            kind: entry.kind,
            narration: entry.narration,
            credit: entry.credit,
            transaction_id: entry.transaction_id,
            created_at: entry.created_utc.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAccountData {
    pub total_customer_sales: Decimal,
    pub total_customer_sale_returns: Decimal,
    pub total_customer_cash: Decimal,
    pub total_customer_credit: Decimal,
    pub list: Vec<EntryResponse>,
}

impl From<PartyAccount> for CustomerAccountData {
    fn from(account: PartyAccount) -> Self {
        let balance = account.balance;
        Self {
            total_customer_sales: balance.total_sales,
            total_customer_sale_returns: balance.total_sale_returns,
            total_customer_cash: balance.total_cash,
            total_customer_credit: balance.total_credit,
            list: account.entries.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAccountData {
    pub total_company_purchases: Decimal,
    pub total_company_cash: Decimal,
    pub total_company_credit: Decimal,
    pub list: Vec<EntryResponse>,
}

impl From<PartyAccount> for CompanyAccountData {
    fn from(account: PartyAccount) -> Self {
        let balance = account.balance;
        Self {
            total_company_purchases: balance.total_purchases,
            total_company_cash: balance.total_cash,
            total_company_credit: balance.total_credit,
            list: account.entries.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartyBalance;
    use chrono::Utc;

    #[test]
    fn amount_is_required() {
        let req: CustomerCashRequest = serde_json::from_str(&format!(
            r#"{{"customerID": "{}", "amount": ""}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        assert!(req.into_parts().unwrap_err().to_string().contains("amount"));
    }

    #[test]
    fn customer_data_shape() {
        let party_id = Uuid::new_v4();
        let mut balance = PartyBalance::new(party_id, Utc::now());
        balance.total_credit = Decimal::from(200);
        let account = PartyAccount {
            balance,
            entries: vec![PartyEntry {
                entry_id: Uuid::new_v4(),
                party_id,
                kind: EntryKind::CreditAdded,
                narration: "manual adj".to_string(),
                credit: Decimal::from(200),
                transaction_id: None,
                created_utc: Utc::now(),
            }],
        };
        let json = serde_json::to_value(CustomerAccountData::from(account)).unwrap();
        assert_eq!(json["totalCustomerCredit"], "200");
        assert_eq!(json["totalCustomerSales"], "0");
        assert_eq!(json["list"][0]["kind"], "credit_added");
        assert_eq!(json["list"][0]["narration"], "manual adj");
    }
}
