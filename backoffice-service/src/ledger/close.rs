//! Month-close aggregation.

use crate::models::TransactionType;
use rust_decimal::Decimal;

/// Period totals over an inclusive date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthClose {
    pub total_purchases: Decimal,
    pub total_sales: Decimal,
    pub total_sales_returns: Decimal,
    pub total_expenses: Decimal,
}

impl MonthClose {
    pub fn add_transaction(&mut self, transaction_type: TransactionType, amount: Decimal) {
        match transaction_type {
            TransactionType::PurchaseInvoice => self.total_purchases += amount,
            TransactionType::SalesInvoice => self.total_sales += amount,
            TransactionType::SaleReturn => self.total_sales_returns += amount,
        }
    }

    pub fn add_expense(&mut self, amount: Decimal) {
        self.total_expenses += amount;
    }

    /// Sales less expenses less purchases. Returns are not subtracted.
    pub fn profit(&self) -> Decimal {
        self.total_sales - self.total_expenses - self.total_purchases
    }
}
