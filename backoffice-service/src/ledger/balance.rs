//! Running customer and company account counters.

use super::bounds;
use super::error::LedgerError;
use super::posting::{PostingPlan, Settlement};
use crate::models::{EntryKind, PartyBalance, PartyEntry, TransactionType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a sale return does to the customer's outstanding credit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnCreditPolicy {
    /// Only `total_sale_returns` moves.
    #[default]
    TrackOnly,
    /// Outstanding credit drops by the return amount, floored at zero.
    ReduceCredit,
}

impl ReturnCreditPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrackOnly => "track_only",
            Self::ReduceCredit => "reduce_credit",
        }
    }
}

impl std::str::FromStr for ReturnCreditPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "track_only" => Ok(Self::TrackOnly),
            "reduce_credit" => Ok(Self::ReduceCredit),
            _ => Err(format!("Invalid return credit policy: {}", s)),
        }
    }
}

/// Narration entry produced by a balance change, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub kind: EntryKind,
    pub narration: String,
    pub credit: Decimal,
    pub transaction_id: Option<Uuid>,
}

impl EntryDraft {
    pub fn into_entry(self, party_id: Uuid, created_utc: DateTime<Utc>) -> PartyEntry {
        PartyEntry {
            entry_id: Uuid::new_v4(),
            party_id,
            kind: self.kind,
            narration: self.narration,
            credit: self.credit,
            transaction_id: self.transaction_id,
            created_utc,
        }
    }
}

impl PartyBalance {
    /// Fold a posted invoice into the counters. Nothing changes if a counter
    /// would leave the stored range.
    pub fn apply_posting(
        &mut self,
        plan: &PostingPlan,
        transaction_id: Uuid,
        transaction_no: i64,
        policy: ReturnCreditPolicy,
    ) -> Result<Option<EntryDraft>, LedgerError> {
        let net = plan.net_amount;
        let Settlement { cash, credit } = plan.settlement;

        let entry = match plan.transaction_type {
            TransactionType::PurchaseInvoice => {
                let total_purchases = bounds::add(self.total_purchases, net, "Total purchases")?;
                let total_cash = bounds::add(self.total_cash, cash, "Total cash")?;
                let total_credit = bounds::add(self.total_credit, credit, "Total credit")?;
                self.total_purchases = total_purchases;
                self.total_cash = total_cash;
                self.total_credit = total_credit;
                (credit > Decimal::ZERO).then(|| EntryDraft {
                    kind: EntryKind::PurchaseCredit,
                    narration: format!("Purchase invoice #{} on credit", transaction_no),
                    credit,
                    transaction_id: Some(transaction_id),
                })
            }
            TransactionType::SalesInvoice => {
                let total_sales = bounds::add(self.total_sales, net, "Total sales")?;
                let total_cash = bounds::add(self.total_cash, cash, "Total cash")?;
                let total_credit = bounds::add(self.total_credit, credit, "Total credit")?;
                self.total_sales = total_sales;
                self.total_cash = total_cash;
                self.total_credit = total_credit;
                (credit > Decimal::ZERO).then(|| EntryDraft {
                    kind: EntryKind::SaleCredit,
                    narration: format!("Sales invoice #{} on credit", transaction_no),
                    credit,
                    transaction_id: Some(transaction_id),
                })
            }
            TransactionType::SaleReturn => {
                self.total_sale_returns =
                    bounds::add(self.total_sale_returns, net, "Total sale returns")?;
                match policy {
                    ReturnCreditPolicy::TrackOnly => None,
                    ReturnCreditPolicy::ReduceCredit => {
                        let reduction = net.min(self.total_credit);
                        if reduction > Decimal::ZERO {
                            self.total_credit -= reduction;
                            Some(EntryDraft {
                                kind: EntryKind::ReturnCredit,
                                narration: format!(
                                    "Sale return #{} reduced credit",
                                    transaction_no
                                ),
                                credit: reduction,
                                transaction_id: Some(transaction_id),
                            })
                        } else {
                            None
                        }
                    }
                }
            }
        };

        self.updated_utc = Utc::now();
        Ok(entry)
    }

    /// Settle part of the outstanding credit in cash.
    pub fn receive_cash(&mut self, amount: Decimal) -> Result<EntryDraft, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "Amount must be greater than zero, got {}",
                amount
            )));
        }
        bounds::check_amount("amount", amount)?;
        if amount > self.total_credit {
            return Err(LedgerError::InvalidAmount(format!(
                "Amount {} exceeds outstanding credit {}",
                amount, self.total_credit
            )));
        }

        let total_cash = bounds::add(self.total_cash, amount, "Total cash")?;
        self.total_credit = bounds::sub(self.total_credit, amount, "Total credit")?;
        self.total_cash = total_cash;
        self.updated_utc = Utc::now();

        Ok(EntryDraft {
            kind: EntryKind::CashReceived,
            narration: format!("Cash received {}", amount),
            credit: amount,
            transaction_id: None,
        })
    }

    /// Manual credit adjustment with a free-text reason.
    pub fn add_credit(&mut self, amount: Decimal, message: &str) -> Result<EntryDraft, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "Amount must be greater than zero, got {}",
                amount
            )));
        }
        bounds::check_amount("amount", amount)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(LedgerError::Validation(
                "message is required when adding credit".to_string(),
            ));
        }

        self.total_credit = bounds::add(self.total_credit, amount, "Total credit")?;
        self.updated_utc = Utc::now();

        Ok(EntryDraft {
            kind: EntryKind::CreditAdded,
            narration: message.to_string(),
            credit: amount,
            transaction_id: None,
        })
    }
}
