//! Month-close reporting.

use crate::ledger::MonthClose;
use crate::models::DateRange;
use crate::services::store::LedgerStore;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct MonthCloseReporter {
    store: Arc<dyn LedgerStore>,
}

impl MonthCloseReporter {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Period totals over the inclusive `range`.
    #[instrument(skip(self), fields(from = %range.from(), to = %range.to()))]
    pub async fn month_close(&self, range: DateRange) -> Result<MonthClose, AppError> {
        let close = self.store.month_close(range).await?;
        info!(
            total_sales = %close.total_sales,
            total_purchases = %close.total_purchases,
            total_expenses = %close.total_expenses,
            "Month close computed"
        );
        Ok(close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{DraftLine, InvoiceDraft, PaymentTerms, ReturnCreditPolicy};
    use crate::models::{
        AccountType, ContactInfo, ExpenseInput, ItemInput, NewAccount, PartyInput, PartyProfile,
        PaymentType, TransactionType,
    };
    use crate::services::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[tokio::test]
    async fn totals_cover_only_the_range() {
        let store = Arc::new(MemoryStore::new());
        let contact = |name: &str| ContactInfo {
            name_full: name.to_string(),
            ..ContactInfo::default()
        };
        let company = store
            .create_party(PartyInput {
                contact: contact("Acme"),
                profile: PartyProfile::Company,
            })
            .await
            .unwrap();
        let salesman = store
            .create_party(PartyInput {
                contact: contact("Bilal"),
                profile: PartyProfile::Salesman { address: None },
            })
            .await
            .unwrap();
        let customer = store
            .create_party(PartyInput {
                contact: contact("Corner Store"),
                profile: PartyProfile::Customer {
                    area_name: "North".to_string(),
                    salesman_id: salesman.party_id,
                },
            })
            .await
            .unwrap();
        let item = store
            .create_item(ItemInput {
                name_full: "Soap".to_string(),
                name_short: None,
                purchase_price: dec("40"),
                sale_price: dec("50"),
                units_in_carton: 12,
                company_id: company.party_id,
            })
            .await
            .unwrap();

        let post = |transaction_type, party_id, payment, date, com: &str| InvoiceDraft {
            transaction_type,
            party_id,
            salesman_id: None,
            transaction_date: date,
            payment,
            lines: vec![DraftLine {
                item_id: item.item_id,
                unit_price: None,
                com_qty: dec(com),
                bonus_qty: Decimal::ZERO,
                sale_price: None,
            }],
        };
        let cash = Some(PaymentTerms {
            payment_type: PaymentType::OnCash,
            cash_amount: None,
        });

        // May: purchase 400. June: sale 150, return 50. July: sale 100.
        for draft in [
            post(TransactionType::PurchaseInvoice, company.party_id, cash, day(5, 20), "10"),
            post(TransactionType::SalesInvoice, customer.party_id, cash, day(6, 10), "3"),
            post(TransactionType::SaleReturn, customer.party_id, None, day(6, 30), "1"),
            post(TransactionType::SalesInvoice, customer.party_id, cash, day(7, 1), "2"),
        ] {
            store
                .post_inventory_transaction(draft, ReturnCreditPolicy::TrackOnly)
                .await
                .unwrap();
        }
        let rent = store
            .create_account(NewAccount {
                ac_name: "Rent".to_string(),
                ac_type: AccountType::Expense,
            })
            .await
            .unwrap();
        store
            .create_expense(ExpenseInput {
                account_id: rent.account_id,
                amount: dec("30"),
                narration: "June rent".to_string(),
                expense_date: Some(day(6, 1)),
            })
            .await
            .unwrap();

        let reporter = MonthCloseReporter::new(store);
        let june = reporter
            .month_close(DateRange::new(day(6, 1), day(6, 30)).unwrap())
            .await
            .unwrap();
        assert_eq!(
            june,
            MonthClose {
                total_purchases: Decimal::ZERO,
                total_sales: dec("150"),
                total_sales_returns: dec("50"),
                total_expenses: dec("30"),
            }
        );
        assert_eq!(june.profit(), dec("120"));

        let one_day = reporter
            .month_close(DateRange::new(day(7, 1), day(7, 1)).unwrap())
            .await
            .unwrap();
        assert_eq!(one_day.total_sales, dec("100"));
        assert!(one_day.total_purchases.is_zero());
        assert!(one_day.total_sales_returns.is_zero());
        assert!(one_day.total_expenses.is_zero());
    }
}
