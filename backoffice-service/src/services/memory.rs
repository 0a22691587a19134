//! In-process ledger store for development and tests.
//!
//! One `tokio::sync::Mutex` guards the whole state. Each mutation works on
//! clones of the records it touches and writes them back only after every
//! rule has passed.

use crate::ledger::error::LedgerError;
use crate::ledger::{
    check_expense, ensure_expense_account, ensure_kind, InvoiceDraft, MonthClose, PostingPlan,
    ReturnCreditPolicy,
};
use crate::models::{
    sort_entries_newest_first, sort_newest_first, AccountType, CoaAccount, DateRange, Expense,
    ExpenseFilter, ExpenseInput, ExpenseUpdate, InventoryTransaction, Item, ItemInput,
    NewAccount, Party, PartyAccount, PartyBalance, PartyEntry, PartyInput, PartyKind,
    RestoreCounts, Snapshot, StockRecord, TransactionCounter, TransactionFilter,
    TransactionType, SNAPSHOT_FORMAT_VERSION,
};
use crate::services::store::LedgerStore;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    parties: HashMap<Uuid, Party>,
    items: HashMap<Uuid, Item>,
    stock: HashMap<Uuid, StockRecord>,
    transactions: Vec<InventoryTransaction>,
    counters: HashMap<TransactionType, i64>,
    balances: HashMap<Uuid, PartyBalance>,
    entries: Vec<PartyEntry>,
    accounts: HashMap<Uuid, CoaAccount>,
    expenses: HashMap<Uuid, Expense>,
}

impl LedgerState {
    fn party(&self, party_id: Uuid) -> Result<&Party, LedgerError> {
        self.parties
            .get(&party_id)
            .ok_or_else(|| LedgerError::not_found("Party", party_id))
    }

    fn party_of_kind(&self, party_id: Uuid, kind: PartyKind) -> Result<&Party, LedgerError> {
        let party = self.party(party_id)?;
        ensure_kind(party, kind)?;
        Ok(party)
    }

    fn check_party_input(&self, input: &PartyInput) -> Result<(), LedgerError> {
        if let Some(salesman_id) = input.profile.salesman_id() {
            self.party_of_kind(salesman_id, PartyKind::Salesman)?;
        }
        Ok(())
    }

    fn account_of(&self, party_id: Uuid) -> PartyAccount {
        let balance = self.balances.get(&party_id).cloned().unwrap_or_else(|| {
            let opened = self
                .parties
                .get(&party_id)
                .map(|p| p.created_utc)
                .unwrap_or_else(Utc::now);
            PartyBalance::new(party_id, opened)
        });
        let mut entries: Vec<PartyEntry> = self
            .entries
            .iter()
            .filter(|e| e.party_id == party_id)
            .cloned()
            .collect();
        sort_entries_newest_first(&mut entries);
        PartyAccount { balance, entries }
    }

    /// Store an updated balance and its narration entry.
    fn commit_balance(&mut self, balance: PartyBalance, entry: Option<PartyEntry>) {
        self.balances.insert(balance.party_id, balance);
        if let Some(entry) = entry {
            self.entries.push(entry);
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut counters: Vec<TransactionCounter> = self
            .counters
            .iter()
            .map(|(transaction_type, last_no)| TransactionCounter {
                transaction_type: *transaction_type,
                last_no: *last_no,
            })
            .collect();
        counters.sort_by_key(|c| c.transaction_type);

        Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: Utc::now(),
            parties: self.parties.values().cloned().collect(),
            items: self.items.values().cloned().collect(),
            stock: self.stock.values().cloned().collect(),
            transactions: self.transactions.clone(),
            counters,
            balances: self.balances.values().cloned().collect(),
            entries: self.entries.clone(),
            accounts: self.accounts.values().cloned().collect(),
            expenses: self.expenses.values().cloned().collect(),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            parties: snapshot.parties.into_iter().map(|p| (p.party_id, p)).collect(),
            items: snapshot.items.into_iter().map(|i| (i.item_id, i)).collect(),
            stock: snapshot.stock.into_iter().map(|s| (s.item_id, s)).collect(),
            transactions: snapshot.transactions,
            counters: snapshot
                .counters
                .into_iter()
                .map(|c| (c.transaction_type, c.last_no))
                .collect(),
            balances: snapshot
                .balances
                .into_iter()
                .map(|b| (b.party_id, b))
                .collect(),
            entries: snapshot.entries,
            accounts: snapshot
                .accounts
                .into_iter()
                .map(|a| (a.account_id, a))
                .collect(),
            expenses: snapshot
                .expenses
                .into_iter()
                .map(|e| (e.expense_id, e))
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<LedgerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    #[instrument(skip(self, input), fields(kind = %input.kind()))]
    async fn create_party(&self, input: PartyInput) -> Result<Party, AppError> {
        let mut state = self.state.lock().await;
        state.check_party_input(&input)?;

        let now = Utc::now();
        let party = Party {
            party_id: Uuid::new_v4(),
            contact: input.contact,
            profile: input.profile,
            created_utc: now,
            updated_utc: now,
        };
        state.parties.insert(party.party_id, party.clone());

        info!(party_id = %party.party_id, "Party created");
        Ok(party)
    }

    #[instrument(skip(self, input), fields(party_id = %party_id))]
    async fn update_party(&self, party_id: Uuid, input: PartyInput) -> Result<Party, AppError> {
        let mut state = self.state.lock().await;
        let existing = state.party(party_id)?;
        if existing.kind() != input.kind() {
            return Err(LedgerError::Validation(format!(
                "Party {} is a {} and cannot become a {}",
                party_id,
                existing.kind(),
                input.kind()
            ))
            .into());
        }
        state.check_party_input(&input)?;

        let mut party = existing.clone();
        party.contact = input.contact;
        party.profile = input.profile;
        party.updated_utc = Utc::now();
        state.parties.insert(party_id, party.clone());

        Ok(party)
    }

    async fn get_party(&self, party_id: Uuid) -> Result<Option<Party>, AppError> {
        Ok(self.state.lock().await.parties.get(&party_id).cloned())
    }

    async fn list_parties(&self, kind: PartyKind) -> Result<Vec<Party>, AppError> {
        let state = self.state.lock().await;
        let mut parties: Vec<Party> = state
            .parties
            .values()
            .filter(|p| p.kind() == kind)
            .cloned()
            .collect();
        parties.sort_by(|a, b| a.created_utc.cmp(&b.created_utc));
        Ok(parties)
    }

    async fn list_salesman_customers(&self, salesman_id: Uuid) -> Result<Vec<Party>, AppError> {
        let state = self.state.lock().await;
        let mut customers: Vec<Party> = state
            .parties
            .values()
            .filter(|p| p.profile.salesman_id() == Some(salesman_id))
            .cloned()
            .collect();
        customers.sort_by(|a, b| a.created_utc.cmp(&b.created_utc));
        Ok(customers)
    }

    #[instrument(skip(self, input), fields(company_id = %input.company_id))]
    async fn create_item(&self, input: ItemInput) -> Result<Item, AppError> {
        let mut state = self.state.lock().await;
        state.party_of_kind(input.company_id, PartyKind::Company)?;

        let now = Utc::now();
        let item = Item {
            item_id: Uuid::new_v4(),
            name_full: input.name_full,
            name_short: input.name_short,
            purchase_price: input.purchase_price,
            sale_price: input.sale_price,
            units_in_carton: input.units_in_carton,
            company_id: input.company_id,
            created_utc: now,
            updated_utc: now,
        };
        state
            .stock
            .insert(item.item_id, StockRecord::new(item.item_id, item.sale_price));
        state.items.insert(item.item_id, item.clone());

        info!(item_id = %item.item_id, "Item created");
        Ok(item)
    }

    #[instrument(skip(self, input), fields(item_id = %item_id))]
    async fn update_item(&self, item_id: Uuid, input: ItemInput) -> Result<Item, AppError> {
        let mut state = self.state.lock().await;
        let mut item = state
            .items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("Item", item_id))?;
        state.party_of_kind(input.company_id, PartyKind::Company)?;

        item.name_full = input.name_full;
        item.name_short = input.name_short;
        item.purchase_price = input.purchase_price;
        item.sale_price = input.sale_price;
        item.units_in_carton = input.units_in_carton;
        item.company_id = input.company_id;
        item.updated_utc = Utc::now();

        let record = state
            .stock
            .entry(item_id)
            .or_insert_with(|| StockRecord::new(item_id, item.sale_price));
        record.sale_price = item.sale_price;
        state.items.insert(item_id, item.clone());

        Ok(item)
    }

    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, AppError> {
        Ok(self.state.lock().await.items.get(&item_id).cloned())
    }

    async fn list_items(&self, company_id: Option<Uuid>) -> Result<Vec<Item>, AppError> {
        let state = self.state.lock().await;
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|i| company_id.map_or(true, |id| id == i.company_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name_full.cmp(&b.name_full));
        Ok(items)
    }

    async fn get_stock(&self, item_id: Uuid) -> Result<Option<StockRecord>, AppError> {
        Ok(self.state.lock().await.stock.get(&item_id).cloned())
    }

    #[instrument(
        skip(self, draft),
        fields(transaction_type = %draft.transaction_type, party_id = %draft.party_id)
    )]
    async fn post_inventory_transaction(
        &self,
        draft: InvoiceDraft,
        policy: ReturnCreditPolicy,
    ) -> Result<InventoryTransaction, AppError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        state.party_of_kind(draft.party_id, draft.transaction_type.party_kind())?;
        if let Some(salesman_id) = draft.salesman_id {
            state.party_of_kind(salesman_id, PartyKind::Salesman)?;
        }

        let mut items: HashMap<Uuid, Item> = draft
            .lines
            .iter()
            .filter_map(|l| state.items.get(&l.item_id))
            .map(|i| (i.item_id, i.clone()))
            .collect();
        let plan = PostingPlan::build(&draft, &items)?;

        let mut stock = Vec::with_capacity(plan.stock_deltas.len());
        for (item_id, delta) in &plan.stock_deltas {
            let mut record = match (state.stock.get(item_id), items.get(item_id)) {
                (Some(record), _) => record.clone(),
                (None, Some(item)) => StockRecord::new(*item_id, item.sale_price),
                (None, None) => return Err(LedgerError::not_found("Item", *item_id).into()),
            };
            record.apply(*delta)?;
            stock.push(record);
        }

        let now = Utc::now();
        for update in &plan.price_updates {
            if let Some(item) = items.get_mut(&update.item_id) {
                item.purchase_price = update.purchase_price;
                item.sale_price = update.sale_price;
                item.updated_utc = now;
            }
            if let Some(record) = stock.iter_mut().find(|r| r.item_id == update.item_id) {
                record.sale_price = update.sale_price;
            }
        }

        let transaction_no = state
            .counters
            .get(&plan.transaction_type)
            .copied()
            .unwrap_or(0)
            + 1;
        let transaction_id = Uuid::new_v4();

        let mut balance = state
            .balances
            .get(&plan.party_id)
            .cloned()
            .unwrap_or_else(|| PartyBalance::new(plan.party_id, now));
        let entry = balance
            .apply_posting(&plan, transaction_id, transaction_no, policy)?
            .map(|e| e.into_entry(plan.party_id, now));
        let transaction = plan.to_transaction(transaction_id, transaction_no, now);

        for record in stock {
            state.stock.insert(record.item_id, record);
        }
        for update in &plan.price_updates {
            if let Some(item) = items.remove(&update.item_id) {
                state.items.insert(item.item_id, item);
            }
        }
        state
            .counters
            .insert(plan.transaction_type, transaction_no);
        state.commit_balance(balance, entry);
        state.transactions.push(transaction.clone());

        info!(
            transaction_id = %transaction.transaction_id,
            transaction_no = transaction.transaction_no,
            amount = %transaction.transaction_amount,
            "Inventory transaction posted"
        );

        Ok(transaction)
    }

    async fn get_inventory_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<InventoryTransaction>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.transaction_id == transaction_id)
            .cloned())
    }

    async fn list_inventory_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<InventoryTransaction>, AppError> {
        let state = self.state.lock().await;
        let mut transactions: Vec<InventoryTransaction> = state
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    async fn get_party_account(&self, party_id: Uuid) -> Result<PartyAccount, AppError> {
        let state = self.state.lock().await;
        state.party(party_id)?;
        Ok(state.account_of(party_id))
    }

    #[instrument(skip(self), fields(party_id = %party_id, amount = %amount))]
    async fn receive_cash(
        &self,
        party_id: Uuid,
        expected_kind: PartyKind,
        amount: Decimal,
    ) -> Result<PartyAccount, AppError> {
        let mut state = self.state.lock().await;
        state.party_of_kind(party_id, expected_kind)?;

        let mut balance = state.account_of(party_id).balance;
        let entry = balance.receive_cash(amount)?.into_entry(party_id, Utc::now());
        state.commit_balance(balance, Some(entry));

        Ok(state.account_of(party_id))
    }

    #[instrument(skip(self, message), fields(party_id = %party_id, amount = %amount))]
    async fn add_credit(
        &self,
        party_id: Uuid,
        amount: Decimal,
        message: String,
    ) -> Result<PartyAccount, AppError> {
        let mut state = self.state.lock().await;
        state.party_of_kind(party_id, PartyKind::Customer)?;

        let mut balance = state.account_of(party_id).balance;
        let entry = balance
            .add_credit(amount, &message)?
            .into_entry(party_id, Utc::now());
        state.commit_balance(balance, Some(entry));

        Ok(state.account_of(party_id))
    }

    async fn create_account(&self, input: NewAccount) -> Result<CoaAccount, AppError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let account = CoaAccount {
            account_id: Uuid::new_v4(),
            ac_name: input.ac_name,
            ac_type: input.ac_type,
            created_utc: now,
            updated_utc: now,
        };
        state.accounts.insert(account.account_id, account.clone());
        Ok(account)
    }

    async fn rename_account(
        &self,
        account_id: Uuid,
        ac_name: String,
    ) -> Result<CoaAccount, AppError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| LedgerError::not_found("Account", account_id))?;
        account.ac_name = ac_name;
        account.updated_utc = Utc::now();
        Ok(account.clone())
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<CoaAccount>, AppError> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn list_accounts(
        &self,
        ac_type: Option<AccountType>,
    ) -> Result<Vec<CoaAccount>, AppError> {
        let state = self.state.lock().await;
        let mut accounts: Vec<CoaAccount> = state
            .accounts
            .values()
            .filter(|a| ac_type.map_or(true, |t| t == a.ac_type))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.ac_name.cmp(&b.ac_name));
        Ok(accounts)
    }

    #[instrument(skip(self, input), fields(account_id = %input.account_id))]
    async fn create_expense(&self, input: ExpenseInput) -> Result<Expense, AppError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get(&input.account_id)
            .ok_or_else(|| LedgerError::not_found("Account", input.account_id))?;
        ensure_expense_account(account)?;
        check_expense(input.amount, &input.narration)?;

        let now = Utc::now();
        let expense = Expense {
            expense_id: Uuid::new_v4(),
            account_id: input.account_id,
            narration: input.narration,
            credit: input.amount,
            expense_date: input.expense_date.unwrap_or_else(|| now.date_naive()),
            created_utc: now,
            updated_utc: now,
        };
        state.expenses.insert(expense.expense_id, expense.clone());
        Ok(expense)
    }

    #[instrument(skip(self, update), fields(expense_id = %expense_id))]
    async fn update_expense(
        &self,
        expense_id: Uuid,
        update: ExpenseUpdate,
    ) -> Result<Expense, AppError> {
        let mut state = self.state.lock().await;
        let expense = state
            .expenses
            .get_mut(&expense_id)
            .ok_or_else(|| LedgerError::not_found("Expense", expense_id))?;
        if update.account_id.is_some_and(|id| id != expense.account_id) {
            return Err(LedgerError::Validation(
                "An expense cannot be moved to another account".to_string(),
            )
            .into());
        }
        check_expense(update.amount, &update.narration)?;

        expense.credit = update.amount;
        expense.narration = update.narration;
        expense.updated_utc = Utc::now();
        Ok(expense.clone())
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
        let state = self.state.lock().await;
        let mut expenses: Vec<Expense> = state
            .expenses
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| {
            b.expense_date
                .cmp(&a.expense_date)
                .then(b.created_utc.cmp(&a.created_utc))
        });
        Ok(expenses)
    }

    async fn month_close(&self, range: DateRange) -> Result<MonthClose, AppError> {
        let state = self.state.lock().await;
        let mut close = MonthClose::default();
        for tx in state
            .transactions
            .iter()
            .filter(|t| range.contains(t.transaction_date))
        {
            close.add_transaction(tx.transaction_type, tx.transaction_amount);
        }
        for expense in state
            .expenses
            .values()
            .filter(|e| range.contains(e.expense_date))
        {
            close.add_expense(expense.credit);
        }
        Ok(close)
    }

    async fn export_snapshot(&self) -> Result<Snapshot, AppError> {
        Ok(self.state.lock().await.to_snapshot())
    }

    #[instrument(skip(self, snapshot))]
    async fn import_snapshot(&self, snapshot: Snapshot) -> Result<RestoreCounts, AppError> {
        snapshot.validate()?;
        let counts = snapshot.counts();

        let mut state = self.state.lock().await;
        *state = LedgerState::from_snapshot(snapshot);

        info!(?counts, "Snapshot restored");
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{DraftLine, PaymentTerms};
    use crate::models::{ContactInfo, PartyProfile, PaymentType};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn contact(name: &str) -> ContactInfo {
        ContactInfo {
            name_full: name.to_string(),
            ..ContactInfo::default()
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        company: Party,
        customer: Party,
        item: Item,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let company = store
            .create_party(PartyInput {
                contact: contact("Acme Foods"),
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
                name_full: "Biscuits".to_string(),
                name_short: None,
                purchase_price: dec("80"),
                sale_price: dec("100"),
                units_in_carton: 24,
                company_id: company.party_id,
            })
            .await
            .unwrap();
        Fixture {
            store,
            company,
            customer,
            item,
        }
    }

    fn draft(
        transaction_type: TransactionType,
        party_id: Uuid,
        payment: Option<PaymentType>,
        lines: Vec<(Uuid, &str, &str)>,
    ) -> InvoiceDraft {
        InvoiceDraft {
            transaction_type,
            party_id,
            salesman_id: None,
            transaction_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            payment: payment.map(|payment_type| PaymentTerms {
                payment_type,
                cash_amount: None,
            }),
            lines: lines
                .into_iter()
                .map(|(item_id, com, bonus)| DraftLine {
                    item_id,
                    unit_price: None,
                    com_qty: dec(com),
                    bonus_qty: dec(bonus),
                    sale_price: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn new_item_starts_with_empty_stock() {
        let f = fixture().await;
        let stock = f.store.get_stock(f.item.item_id).await.unwrap().unwrap();
        assert!(stock.com_qty.is_zero());
        assert!(stock.bonus_qty.is_zero());
        assert_eq!(stock.sale_price, dec("100"));
    }

    #[tokio::test]
    async fn failing_line_leaves_no_trace() {
        let f = fixture().await;
        let other = f
            .store
            .create_item(ItemInput {
                name_full: "Wafers".to_string(),
                name_short: None,
                purchase_price: dec("10"),
                sale_price: dec("12"),
                units_in_carton: 12,
                company_id: f.company.party_id,
            })
            .await
            .unwrap();
        f.store
            .post_inventory_transaction(
                draft(
                    TransactionType::PurchaseInvoice,
                    f.company.party_id,
                    Some(PaymentType::OnCash),
                    vec![(f.item.item_id, "5", "0")],
                ),
                ReturnCreditPolicy::TrackOnly,
            )
            .await
            .unwrap();

        let err = f
            .store
            .post_inventory_transaction(
                draft(
                    TransactionType::SalesInvoice,
                    f.customer.party_id,
                    Some(PaymentType::OnCredit),
                    vec![(f.item.item_id, "2", "0"), (other.item_id, "1", "0")],
                ),
                ReturnCreditPolicy::TrackOnly,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");

        let stock = f.store.get_stock(f.item.item_id).await.unwrap().unwrap();
        assert_eq!(stock.com_qty, dec("5"));
        let sales = f
            .store
            .list_inventory_transactions(&TransactionFilter::of_type(TransactionType::SalesInvoice))
            .await
            .unwrap();
        assert!(sales.is_empty());
        let account = f.store.get_party_account(f.customer.party_id).await.unwrap();
        assert!(account.balance.total_credit.is_zero());
        assert!(account.entries.is_empty());
    }

    #[tokio::test]
    async fn numbers_are_sequential_per_type() {
        let f = fixture().await;
        for expected in 1..=3 {
            let tx = f
                .store
                .post_inventory_transaction(
                    draft(
                        TransactionType::PurchaseInvoice,
                        f.company.party_id,
                        Some(PaymentType::OnCash),
                        vec![(f.item.item_id, "1", "0")],
                    ),
                    ReturnCreditPolicy::TrackOnly,
                )
                .await
                .unwrap();
            assert_eq!(tx.transaction_no, expected);
        }
        let sale = f
            .store
            .post_inventory_transaction(
                draft(
                    TransactionType::SalesInvoice,
                    f.customer.party_id,
                    Some(PaymentType::OnCash),
                    vec![(f.item.item_id, "1", "0")],
                ),
                ReturnCreditPolicy::TrackOnly,
            )
            .await
            .unwrap();
        assert_eq!(sale.transaction_no, 1);
    }

    #[tokio::test]
    async fn concurrent_sales_never_overdraw() {
        let f = fixture().await;
        f.store
            .post_inventory_transaction(
                draft(
                    TransactionType::PurchaseInvoice,
                    f.company.party_id,
                    Some(PaymentType::OnCash),
                    vec![(f.item.item_id, "10", "0")],
                ),
                ReturnCreditPolicy::TrackOnly,
            )
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = f.store.clone();
            let d = draft(
                TransactionType::SalesInvoice,
                f.customer.party_id,
                Some(PaymentType::OnCash),
                vec![(f.item.item_id, "3", "0")],
            );
            handles.push(tokio::spawn(async move {
                store
                    .post_inventory_transaction(d, ReturnCreditPolicy::TrackOnly)
                    .await
                    .is_ok()
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 3);
        let stock = f.store.get_stock(f.item.item_id).await.unwrap().unwrap();
        assert_eq!(stock.com_qty, dec("1"));
    }

    #[tokio::test]
    async fn company_cannot_be_invoiced_as_customer() {
        let f = fixture().await;
        let err = f
            .store
            .post_inventory_transaction(
                draft(
                    TransactionType::SalesInvoice,
                    f.company.party_id,
                    Some(PaymentType::OnCash),
                    vec![(f.item.item_id, "1", "0")],
                ),
                ReturnCreditPolicy::TrackOnly,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn party_kind_is_immutable() {
        let f = fixture().await;
        let err = f
            .store
            .update_party(
                f.company.party_id,
                PartyInput {
                    contact: contact("Acme"),
                    profile: PartyProfile::Salesman { address: None },
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn snapshot_round_trip_restores_account_data() {
        let f = fixture().await;
        f.store
            .post_inventory_transaction(
                draft(
                    TransactionType::PurchaseInvoice,
                    f.company.party_id,
                    Some(PaymentType::OnCredit),
                    vec![(f.item.item_id, "10", "1")],
                ),
                ReturnCreditPolicy::TrackOnly,
            )
            .await
            .unwrap();
        let before = f.store.get_party_account(f.company.party_id).await.unwrap();
        let snapshot = f.store.export_snapshot().await.unwrap();

        let restored = MemoryStore::new();
        let counts = restored.import_snapshot(snapshot).await.unwrap();
        assert_eq!(counts.parties, 3);
        assert_eq!(counts.transactions, 1);

        let after = restored.get_party_account(f.company.party_id).await.unwrap();
        assert_eq!(before, after);

        let next = restored
            .post_inventory_transaction(
                draft(
                    TransactionType::PurchaseInvoice,
                    f.company.party_id,
                    Some(PaymentType::OnCash),
                    vec![(f.item.item_id, "1", "0")],
                ),
                ReturnCreditPolicy::TrackOnly,
            )
            .await
            .unwrap();
        assert_eq!(next.transaction_no, 2);
    }

    #[tokio::test]
    async fn snapshot_with_wrong_version_is_rejected() {
        let f = fixture().await;
        let mut snapshot = f.store.export_snapshot().await.unwrap();
        snapshot.format_version = 99;

        let restored = MemoryStore::new();
        assert!(restored.import_snapshot(snapshot).await.is_err());
        assert!(restored
            .list_parties(PartyKind::Company)
            .await
            .unwrap()
            .is_empty());
    }
}
