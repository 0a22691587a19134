//! Item catalog and stock records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog item owned by a company.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub item_id: Uuid,
    pub name_full: String,
    pub name_short: Option<String>,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    pub units_in_carton: i32,
    pub company_id: Uuid,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating or updating an item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemInput {
    pub name_full: String,
    pub name_short: Option<String>,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    pub units_in_carton: i32,
    pub company_id: Uuid,
}

/// On-hand quantities for one item. Only inventory postings mutate it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct StockRecord {
    pub item_id: Uuid,
    pub com_qty: Decimal,
    pub bonus_qty: Decimal,
    pub sale_price: Decimal,
    pub updated_utc: DateTime<Utc>,
}

impl StockRecord {
    pub fn new(item_id: Uuid, sale_price: Decimal) -> Self {
        Self {
            item_id,
            com_qty: Decimal::ZERO,
            bonus_qty: Decimal::ZERO,
            sale_price,
            updated_utc: Utc::now(),
        }
    }
}
