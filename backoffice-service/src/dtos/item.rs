use super::{de, required};
use crate::models::{Item, ItemInput, StockRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub name_full: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub name_short: Option<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub purchase_price: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub sale_price: Option<Decimal>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub units_in_carton: Option<i32>,
    #[serde(default, rename = "companyID", deserialize_with = "de::opt_uuid")]
    pub company_id: Option<Uuid>,
}

impl ItemRequest {
    pub fn into_input(self) -> Result<ItemInput, AppError> {
        Ok(ItemInput {
            name_full: self.name_full.unwrap_or_default(),
            name_short: self.name_short,
            purchase_price: required(self.purchase_price, "purchasePrice")?,
            sale_price: required(self.sale_price, "salePrice")?,
            units_in_carton: self.units_in_carton.unwrap_or(1),
            company_id: required(self.company_id, "companyID")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    #[serde(default, rename = "companyID", deserialize_with = "de::opt_uuid")]
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    #[serde(default, rename = "itemID", deserialize_with = "de::opt_uuid")]
    pub item_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: Uuid,
    pub name_full: String,
    pub name_short: Option<String>,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    pub units_in_carton: i32,
    #[serde(rename = "companyID")]
    pub company_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.item_id,
            name_full: item.name_full,
            name_short: item.name_short,
            purchase_price: item.purchase_price,
            sale_price: item.sale_price,
            units_in_carton: item.units_in_carton,
            company_id: item.company_id,
            created_at: item.created_utc.to_rfc3339(),
            updated_at: item.updated_utc.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    #[serde(rename = "itemID")]
    pub item_id: Uuid,
    pub com_qty: Decimal,
    pub bonus_qty: Decimal,
    pub sale_price: Decimal,
    pub updated_at: String,
}

impl From<StockRecord> for StockResponse {
    fn from(stock: StockRecord) -> Self {
        Self {
            item_id: stock.item_id,
            com_qty: stock.com_qty,
            bonus_qty: stock.bonus_qty,
            sale_price: stock.sale_price,
            updated_at: stock.updated_utc.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_as_strings_or_numbers() {
        let company = Uuid::new_v4();
        let req: ItemRequest = serde_json::from_str(&format!(
            r#"{{"nameFull": "Soap", "purchasePrice": "40.50", "salePrice": 55,
                "unitsInCarton": "12", "companyID": "{}"}}"#,
            company
        ))
        .unwrap();
        let input = req.into_input().unwrap();
        assert_eq!(input.purchase_price, Decimal::new(4050, 2));
        assert_eq!(input.sale_price, Decimal::from(55));
        assert_eq!(input.units_in_carton, 12);
        assert_eq!(input.company_id, company);
    }

    #[test]
    fn missing_company_is_rejected() {
        let req: ItemRequest =
            serde_json::from_str(r#"{"nameFull": "Soap", "purchasePrice": 1, "salePrice": 2}"#)
                .unwrap();
        let err = req.into_input().unwrap_err();
        assert!(err.to_string().contains("companyID"));
    }

    #[test]
    fn decimals_serialize_as_strings() {
        let stock = StockRecord::new(Uuid::new_v4(), Decimal::new(5500, 2));
        let json = serde_json::to_value(StockResponse::from(stock)).unwrap();
        assert_eq!(json["salePrice"], "55.00");
        assert_eq!(json["comQty"], "0");
    }
}
