//! Full-state backup archive.

use super::{
    CoaAccount, Expense, InventoryTransaction, Item, Party, PartyBalance, PartyEntry, PartyKind,
    StockRecord, TransactionType,
};
use crate::ledger::bounds::check_amount;
use crate::ledger::error::LedgerError;
use crate::ledger::ensure_kind;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Last number issued for a transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCounter {
    pub transaction_type: TransactionType,
    pub last_no: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub parties: Vec<Party>,
    pub items: Vec<Item>,
    pub stock: Vec<StockRecord>,
    pub transactions: Vec<InventoryTransaction>,
    pub counters: Vec<TransactionCounter>,
    pub balances: Vec<PartyBalance>,
    pub entries: Vec<PartyEntry>,
    pub accounts: Vec<CoaAccount>,
    pub expenses: Vec<Expense>,
}

/// Entity counts written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreCounts {
    pub parties: usize,
    pub items: usize,
    pub transactions: usize,
    pub accounts: usize,
    pub expenses: usize,
    pub entries: usize,
}

impl Snapshot {
    pub fn counts(&self) -> RestoreCounts {
        RestoreCounts {
            parties: self.parties.len(),
            items: self.items.len(),
            transactions: self.transactions.len(),
            accounts: self.accounts.len(),
            expenses: self.expenses.len(),
            entries: self.entries.len(),
        }
    }

    /// Money and quantity values in the archive, tagged with their field.
    fn amounts(&self) -> Vec<(&'static str, Decimal)> {
        let mut out = Vec::new();
        for item in &self.items {
            out.push(("purchasePrice", item.purchase_price));
            out.push(("salePrice", item.sale_price));
        }
        for record in &self.stock {
            out.extend([
                ("comQty", record.com_qty),
                ("bonusQty", record.bonus_qty),
                ("salePrice", record.sale_price),
            ]);
        }
        for tx in &self.transactions {
            out.extend([
                ("transactionAmount", tx.transaction_amount),
                ("cashAmount", tx.cash_amount),
                ("creditAmount", tx.credit_amount),
            ]);
            for line in &tx.lines {
                out.extend([
                    ("unitPrice", line.unit_price),
                    ("comQty", line.com_qty),
                    ("bonusQty", line.bonus_qty),
                    ("lineTotal", line.line_total),
                ]);
            }
        }
        for b in &self.balances {
            out.extend([
                ("totalSales", b.total_sales),
                ("totalSaleReturns", b.total_sale_returns),
                ("totalPurchases", b.total_purchases),
                ("totalCash", b.total_cash),
                ("totalCredit", b.total_credit),
            ]);
        }
        out.extend(self.entries.iter().map(|e| ("credit", e.credit)));
        out.extend(self.expenses.iter().map(|e| ("credit", e.credit)));
        out
    }

    /// Check the format version, the stored range of every amount and that
    /// every reference resolves before anything is replaced.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(LedgerError::Validation(format!(
                "Unsupported backup format version {} (expected {})",
                self.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        for (field, value) in self.amounts() {
            check_amount(field, value)?;
        }

        let parties: HashMap<Uuid, &Party> =
            self.parties.iter().map(|p| (p.party_id, p)).collect();
        let items: HashSet<Uuid> = self.items.iter().map(|i| i.item_id).collect();
        let accounts: HashSet<Uuid> = self.accounts.iter().map(|a| a.account_id).collect();
        let transactions: HashSet<Uuid> =
            self.transactions.iter().map(|t| t.transaction_id).collect();

        let party = |id: Uuid| {
            parties
                .get(&id)
                .copied()
                .ok_or_else(|| dangling("party", id))
        };

        for p in &self.parties {
            if let Some(salesman_id) = p.profile.salesman_id() {
                ensure_kind(party(salesman_id)?, PartyKind::Salesman)?;
            }
        }
        for item in &self.items {
            ensure_kind(party(item.company_id)?, PartyKind::Company)?;
        }
        for record in &self.stock {
            if !items.contains(&record.item_id) {
                return Err(dangling("item", record.item_id));
            }
            if record.com_qty < Decimal::ZERO || record.bonus_qty < Decimal::ZERO {
                return Err(LedgerError::Validation(format!(
                    "Backup holds negative stock for item {}",
                    record.item_id
                )));
            }
        }
        for tx in &self.transactions {
            ensure_kind(party(tx.party_id)?, tx.transaction_type.party_kind())?;
            if let Some(salesman_id) = tx.salesman_id {
                ensure_kind(party(salesman_id)?, PartyKind::Salesman)?;
            }
            if let Some(line) = tx.lines.iter().find(|l| !items.contains(&l.item_id)) {
                return Err(dangling("item", line.item_id));
            }
        }
        for balance in &self.balances {
            party(balance.party_id)?;
        }
        for entry in &self.entries {
            party(entry.party_id)?;
            if let Some(tx_id) = entry.transaction_id {
                if !transactions.contains(&tx_id) {
                    return Err(dangling("transaction", tx_id));
                }
            }
        }
        for expense in &self.expenses {
            if !accounts.contains(&expense.account_id) {
                return Err(dangling("account", expense.account_id));
            }
        }
        Ok(())
    }
}

fn dangling(entity: &str, id: Uuid) -> LedgerError {
    LedgerError::Validation(format!("Backup references unknown {} {}", entity, id))
}
