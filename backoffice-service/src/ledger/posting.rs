//! Turning an invoice draft into the concrete effects of posting it.
//!
//! Everything here is pure: a [`PostingPlan`] describes the priced lines, the
//! stock deltas, the settlement and any catalog price refreshes. The store
//! applies the plan inside one unit of work.

use super::bounds::{self, check_amount};
use super::error::LedgerError;
use super::stock::{validate_quantity, StockDelta};
use crate::models::{
    InventoryTransaction, Item, PaymentType, TransactionLine, TransactionType,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct DraftLine {
    pub item_id: Uuid,
    /// Falls back to the catalog price when absent.
    pub unit_price: Option<Decimal>,
    pub com_qty: Decimal,
    pub bonus_qty: Decimal,
    /// Purchase only: new sale price for the item.
    pub sale_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentTerms {
    pub payment_type: PaymentType,
    pub cash_amount: Option<Decimal>,
}

/// Unposted invoice as submitted by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub transaction_type: TransactionType,
    pub party_id: Uuid,
    pub salesman_id: Option<Uuid>,
    pub transaction_date: NaiveDate,
    pub payment: Option<PaymentTerms>,
    pub lines: Vec<DraftLine>,
}

impl InvoiceDraft {
    /// Shape checks that need no stored state.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.lines.is_empty() {
            return Err(LedgerError::Validation(
                "An invoice needs at least one line item".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.lines.len());
        for line in &self.lines {
            if !seen.insert(line.item_id) {
                return Err(LedgerError::Validation(format!(
                    "Item {} appears on more than one line",
                    line.item_id
                )));
            }
            validate_quantity("comQty", line.com_qty)?;
            validate_quantity("bonusQty", line.bonus_qty)?;
            if (line.com_qty + line.bonus_qty).is_zero() {
                return Err(LedgerError::Validation(format!(
                    "Line for item {} has no quantity",
                    line.item_id
                )));
            }
            if line.unit_price.is_some_and(|p| p < Decimal::ZERO) {
                return Err(LedgerError::Validation(format!(
                    "Unit price for item {} must not be negative",
                    line.item_id
                )));
            }
            if let Some(price) = line.unit_price {
                check_amount("unitPrice", price)?;
            }
            match line.sale_price {
                Some(_) if self.transaction_type != TransactionType::PurchaseInvoice => {
                    return Err(LedgerError::Validation(
                        "salePrice can only be set on purchase lines".to_string(),
                    ));
                }
                Some(p) if p < Decimal::ZERO => {
                    return Err(LedgerError::Validation(format!(
                        "Sale price for item {} must not be negative",
                        line.item_id
                    )));
                }
                Some(p) => check_amount("salePrice", p)?,
                None => {}
            }
        }

        if let Some(cash) = self.payment.and_then(|p| p.cash_amount) {
            check_amount("cashAmount", cash)?;
        }

        match (self.transaction_type, self.payment) {
            (TransactionType::SaleReturn, Some(_)) => {
                return Err(LedgerError::Validation(
                    "Sale returns do not take a payment type".to_string(),
                ));
            }
            (TransactionType::PurchaseInvoice | TransactionType::SalesInvoice, None) => {
                return Err(LedgerError::Validation(
                    "paymentType is required".to_string(),
                ));
            }
            _ => {}
        }

        if self.salesman_id.is_some() && self.transaction_type != TransactionType::SalesInvoice {
            return Err(LedgerError::Validation(
                "salesmanID is only accepted on sales invoices".to_string(),
            ));
        }

        Ok(())
    }

    /// Line item ids in ascending order, the order stock rows are locked in.
    pub fn item_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.lines.iter().map(|l| l.item_id).collect();
        ids.sort();
        ids
    }
}

/// Cash/credit split of an invoice total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settlement {
    pub cash: Decimal,
    pub credit: Decimal,
}

impl PaymentType {
    /// Split `net` into cash and credit. Only PARTIAL reads `cash_amount`.
    pub fn settle(
        self,
        net: Decimal,
        cash_amount: Option<Decimal>,
    ) -> Result<Settlement, LedgerError> {
        let cash = match self {
            PaymentType::OnCash => net,
            PaymentType::OnCredit => Decimal::ZERO,
            PaymentType::Partial => {
                let cash = cash_amount.ok_or_else(|| {
                    LedgerError::Validation(
                        "cashAmount is required for PARTIAL payments".to_string(),
                    )
                })?;
                if cash < Decimal::ZERO || cash > net {
                    return Err(LedgerError::InvalidAmount(format!(
                        "cashAmount {} must be between 0 and the invoice total {}",
                        cash, net
                    )));
                }
                cash
            }
        };
        Ok(Settlement {
            cash,
            credit: net - cash,
        })
    }
}

/// Catalog price refresh carried by a purchase line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceUpdate {
    pub item_id: Uuid,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostingPlan {
    pub transaction_type: TransactionType,
    pub party_id: Uuid,
    pub salesman_id: Option<Uuid>,
    pub transaction_date: NaiveDate,
    pub payment_type: Option<PaymentType>,
    pub lines: Vec<TransactionLine>,
    pub net_amount: Decimal,
    pub settlement: Settlement,
    pub stock_deltas: Vec<(Uuid, StockDelta)>,
    pub price_updates: Vec<PriceUpdate>,
}

impl PostingPlan {
    /// Price and settle `draft` against the catalog entries in `items`.
    pub fn build(draft: &InvoiceDraft, items: &HashMap<Uuid, Item>) -> Result<Self, LedgerError> {
        draft.validate()?;

        let mut lines = Vec::with_capacity(draft.lines.len());
        let mut stock_deltas = Vec::with_capacity(draft.lines.len());
        let mut price_updates = Vec::new();

        for line in &draft.lines {
            let item = items
                .get(&line.item_id)
                .ok_or_else(|| LedgerError::not_found("Item", line.item_id))?;

            let unit_price = line.unit_price.unwrap_or(match draft.transaction_type {
                TransactionType::PurchaseInvoice => item.purchase_price,
                TransactionType::SalesInvoice | TransactionType::SaleReturn => item.sale_price,
            });

            let delta = match draft.transaction_type {
                TransactionType::SalesInvoice => StockDelta::outbound(line.com_qty, line.bonus_qty),
                TransactionType::PurchaseInvoice | TransactionType::SaleReturn => {
                    StockDelta::inbound(line.com_qty, line.bonus_qty)
                }
            };

            if let Some(sale_price) = line.sale_price {
                price_updates.push(PriceUpdate {
                    item_id: item.item_id,
                    purchase_price: unit_price,
                    sale_price,
                });
            }

            lines.push(TransactionLine {
                item_id: line.item_id,
                unit_price,
                com_qty: line.com_qty,
                bonus_qty: line.bonus_qty,
                line_total: bounds::mul(unit_price, line.com_qty, "Line total")?,
            });
            stock_deltas.push((line.item_id, delta));
        }

        stock_deltas.sort_by_key(|(item_id, _)| *item_id);

        let net_amount = lines.iter().try_fold(Decimal::ZERO, |total, l| {
            bounds::add(total, l.line_total, "Invoice total")
        })?;
        let settlement = match draft.payment {
            Some(terms) => terms.payment_type.settle(net_amount, terms.cash_amount)?,
            None => Settlement::default(),
        };

        Ok(Self {
            transaction_type: draft.transaction_type,
            party_id: draft.party_id,
            salesman_id: draft.salesman_id,
            transaction_date: draft.transaction_date,
            payment_type: draft.payment.map(|p| p.payment_type),
            lines,
            net_amount,
            settlement,
            stock_deltas,
            price_updates,
        })
    }

    pub fn to_transaction(
        &self,
        transaction_id: Uuid,
        transaction_no: i64,
        created_utc: DateTime<Utc>,
    ) -> InventoryTransaction {
        InventoryTransaction {
            transaction_id,
            transaction_type: self.transaction_type,
            transaction_no,
            transaction_date: self.transaction_date,
            party_id: self.party_id,
            salesman_id: self.salesman_id,
            payment_type: self.payment_type,
            transaction_amount: self.net_amount,
            cash_amount: self.settlement.cash,
            credit_amount: self.settlement.credit,
            lines: self.lines.clone(),
            created_utc,
        }
    }
}
