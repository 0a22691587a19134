//! PostgreSQL ledger store.

use crate::ledger::error::LedgerError;
use crate::ledger::{
    check_expense, ensure_expense_account, ensure_kind, InvoiceDraft, MonthClose, PostingPlan,
    ReturnCreditPolicy,
};
use crate::models::{
    AccountType, CoaAccount, ContactInfo, DateRange, Expense, ExpenseFilter, ExpenseInput,
    ExpenseUpdate, InventoryTransaction, Item, ItemInput, NewAccount, Party, PartyAccount,
    PartyBalance, PartyEntry, PartyInput, PartyKind, PartyProfile, PaymentType, RestoreCounts,
    Snapshot, StockRecord, TransactionCounter, TransactionFilter, TransactionLine,
    TransactionType, SNAPSHOT_FORMAT_VERSION,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::LedgerStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgConnection, PgExecutor, PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const PARTY_COLUMNS: &str = "party_id, kind, name_full, name_short, email1, email2, email3, \
     phone1, phone2, phone3, area_name, salesman_id, address, created_utc, updated_utc";
const ITEM_COLUMNS: &str = "item_id, name_full, name_short, purchase_price, sale_price, \
     units_in_carton, company_id, created_utc, updated_utc";
const TRANSACTION_COLUMNS: &str = "transaction_id, transaction_type, transaction_no, \
     transaction_date, party_id, salesman_id, payment_type, transaction_amount, cash_amount, \
     credit_amount, created_utc";
const BALANCE_COLUMNS: &str = "party_id, total_sales, total_sale_returns, total_purchases, \
     total_cash, total_credit, updated_utc";
const ENTRY_COLUMNS: &str =
    "entry_id, party_id, kind, narration, credit, transaction_id, created_utc";
const EXPENSE_COLUMNS: &str =
    "expense_id, account_id, narration, credit, expense_date, created_utc, updated_utc";

/// Map a sqlx error, surfacing serialization failures and deadlocks as
/// retryable conflicts.
fn db_error(context: &str, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
            return AppError::Conflict(anyhow::anyhow!(
                "{}: concurrent update, retry the request",
                context
            ));
        }
    }
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

#[derive(Debug, FromRow)]
struct PartyRow {
    party_id: Uuid,
    kind: PartyKind,
    name_full: String,
    name_short: Option<String>,
    email1: Option<String>,
    email2: Option<String>,
    email3: Option<String>,
    phone1: Option<String>,
    phone2: Option<String>,
    phone3: Option<String>,
    area_name: Option<String>,
    salesman_id: Option<Uuid>,
    address: Option<String>,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<PartyRow> for Party {
    type Error = AppError;

    fn try_from(row: PartyRow) -> Result<Self, Self::Error> {
        let profile = match row.kind {
            PartyKind::Customer => PartyProfile::Customer {
                area_name: row.area_name.unwrap_or_default(),
                salesman_id: row.salesman_id.ok_or_else(|| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Customer {} has no salesman",
                        row.party_id
                    ))
                })?,
            },
            PartyKind::Salesman => PartyProfile::Salesman {
                address: row.address,
            },
            PartyKind::Company => PartyProfile::Company,
        };

        Ok(Party {
            party_id: row.party_id,
            contact: ContactInfo {
                name_full: row.name_full,
                name_short: row.name_short,
                email1: row.email1,
                email2: row.email2,
                email3: row.email3,
                phone1: row.phone1,
                phone2: row.phone2,
                phone3: row.phone3,
            },
            profile,
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
        })
    }
}

/// Profile-specific columns: (area_name, salesman_id, address).
fn profile_columns(profile: &PartyProfile) -> (Option<&str>, Option<Uuid>, Option<&str>) {
    match profile {
        PartyProfile::Customer {
            area_name,
            salesman_id,
        } => (Some(area_name.as_str()), Some(*salesman_id), None),
        PartyProfile::Salesman { address } => (None, None, address.as_deref()),
        PartyProfile::Company => (None, None, None),
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    transaction_id: Uuid,
    transaction_type: TransactionType,
    transaction_no: i64,
    transaction_date: NaiveDate,
    party_id: Uuid,
    salesman_id: Option<Uuid>,
    payment_type: Option<PaymentType>,
    transaction_amount: Decimal,
    cash_amount: Decimal,
    credit_amount: Decimal,
    created_utc: DateTime<Utc>,
}

impl TransactionRow {
    fn into_transaction(self, lines: Vec<TransactionLine>) -> InventoryTransaction {
        InventoryTransaction {
            transaction_id: self.transaction_id,
            transaction_type: self.transaction_type,
            transaction_no: self.transaction_no,
            transaction_date: self.transaction_date,
            party_id: self.party_id,
            salesman_id: self.salesman_id,
            payment_type: self.payment_type,
            transaction_amount: self.transaction_amount,
            cash_amount: self.cash_amount,
            credit_amount: self.credit_amount,
            lines,
            created_utc: self.created_utc,
        }
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    transaction_id: Uuid,
    item_id: Uuid,
    unit_price: Decimal,
    com_qty: Decimal,
    bonus_qty: Decimal,
    line_total: Decimal,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "backoffice-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, AppError> {
        self.pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))
    }

    // -------------------------------------------------------------------------
    // Row helpers
    // -------------------------------------------------------------------------

    async fn fetch_party<'e, E: PgExecutor<'e>>(
        executor: E,
        party_id: Uuid,
    ) -> Result<Option<Party>, AppError> {
        sqlx::query_as::<_, PartyRow>(&format!(
            "SELECT {} FROM parties WHERE party_id = $1",
            PARTY_COLUMNS
        ))
        .bind(party_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| db_error("Failed to get party", e))?
        .map(Party::try_from)
        .transpose()
    }

    async fn require_party(
        conn: &mut PgConnection,
        party_id: Uuid,
        kind: PartyKind,
    ) -> Result<Party, AppError> {
        let party = Self::fetch_party(&mut *conn, party_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Party", party_id))?;
        ensure_kind(&party, kind)?;
        Ok(party)
    }

    async fn check_party_input(
        conn: &mut PgConnection,
        input: &PartyInput,
    ) -> Result<(), AppError> {
        if let Some(salesman_id) = input.profile.salesman_id() {
            Self::require_party(conn, salesman_id, PartyKind::Salesman).await?;
        }
        Ok(())
    }

    /// Lock the party's balance row, creating it on first use.
    async fn lock_balance(
        conn: &mut PgConnection,
        party_id: Uuid,
    ) -> Result<PartyBalance, AppError> {
        sqlx::query("INSERT INTO party_balances (party_id) VALUES ($1) ON CONFLICT (party_id) DO NOTHING")
            .bind(party_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to create balance", e))?;

        sqlx::query_as::<_, PartyBalance>(&format!(
            "SELECT {} FROM party_balances WHERE party_id = $1 FOR UPDATE",
            BALANCE_COLUMNS
        ))
        .bind(party_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to lock balance", e))
    }

    async fn write_balance(
        conn: &mut PgConnection,
        balance: &PartyBalance,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO party_balances (party_id, total_sales, total_sale_returns, total_purchases, total_cash, total_credit, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (party_id) DO UPDATE SET
                total_sales = EXCLUDED.total_sales,
                total_sale_returns = EXCLUDED.total_sale_returns,
                total_purchases = EXCLUDED.total_purchases,
                total_cash = EXCLUDED.total_cash,
                total_credit = EXCLUDED.total_credit,
                updated_utc = EXCLUDED.updated_utc
            "#,
        )
        .bind(balance.party_id)
        .bind(balance.total_sales)
        .bind(balance.total_sale_returns)
        .bind(balance.total_purchases)
        .bind(balance.total_cash)
        .bind(balance.total_credit)
        .bind(balance.updated_utc)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to write balance", e))?;
        Ok(())
    }

    async fn insert_entry(conn: &mut PgConnection, entry: &PartyEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO party_entries (entry_id, party_id, kind, narration, credit, transaction_id, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.entry_id)
        .bind(entry.party_id)
        .bind(entry.kind)
        .bind(&entry.narration)
        .bind(entry.credit)
        .bind(entry.transaction_id)
        .bind(entry.created_utc)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to insert party entry", e))?;
        Ok(())
    }

    async fn insert_party(conn: &mut PgConnection, party: &Party) -> Result<(), AppError> {
        let (area_name, salesman_id, address) = profile_columns(&party.profile);
        sqlx::query(&format!(
            "INSERT INTO parties ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            PARTY_COLUMNS
        ))
        .bind(party.party_id)
        .bind(party.kind())
        .bind(&party.contact.name_full)
        .bind(&party.contact.name_short)
        .bind(&party.contact.email1)
        .bind(&party.contact.email2)
        .bind(&party.contact.email3)
        .bind(&party.contact.phone1)
        .bind(&party.contact.phone2)
        .bind(&party.contact.phone3)
        .bind(area_name)
        .bind(salesman_id)
        .bind(address)
        .bind(party.created_utc)
        .bind(party.updated_utc)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to insert party", e))?;
        Ok(())
    }

    async fn insert_item(conn: &mut PgConnection, item: &Item) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO items ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            ITEM_COLUMNS
        ))
        .bind(item.item_id)
        .bind(&item.name_full)
        .bind(&item.name_short)
        .bind(item.purchase_price)
        .bind(item.sale_price)
        .bind(item.units_in_carton)
        .bind(item.company_id)
        .bind(item.created_utc)
        .bind(item.updated_utc)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to insert item", e))?;
        Ok(())
    }

    async fn write_stock(conn: &mut PgConnection, record: &StockRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO stock (item_id, com_qty, bonus_qty, sale_price, updated_utc)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (item_id) DO UPDATE SET
                com_qty = EXCLUDED.com_qty,
                bonus_qty = EXCLUDED.bonus_qty,
                sale_price = EXCLUDED.sale_price,
                updated_utc = EXCLUDED.updated_utc
            "#,
        )
        .bind(record.item_id)
        .bind(record.com_qty)
        .bind(record.bonus_qty)
        .bind(record.sale_price)
        .bind(record.updated_utc)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to write stock", e))?;
        Ok(())
    }

    async fn insert_transaction(
        conn: &mut PgConnection,
        transaction: &InventoryTransaction,
    ) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO inventory_transactions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction.transaction_id)
        .bind(transaction.transaction_type)
        .bind(transaction.transaction_no)
        .bind(transaction.transaction_date)
        .bind(transaction.party_id)
        .bind(transaction.salesman_id)
        .bind(transaction.payment_type)
        .bind(transaction.transaction_amount)
        .bind(transaction.cash_amount)
        .bind(transaction.credit_amount)
        .bind(transaction.created_utc)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to insert transaction", e))?;

        for (line_no, line) in transaction.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO inventory_transaction_items (transaction_id, line_no, item_id, unit_price, com_qty, bonus_qty, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(transaction.transaction_id)
            .bind(line_no as i32 + 1)
            .bind(line.item_id)
            .bind(line.unit_price)
            .bind(line.com_qty)
            .bind(line.bonus_qty)
            .bind(line.line_total)
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to insert transaction line", e))?;
        }
        Ok(())
    }

    async fn insert_expense(conn: &mut PgConnection, expense: &Expense) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO expenses ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            EXPENSE_COLUMNS
        ))
        .bind(expense.expense_id)
        .bind(expense.account_id)
        .bind(&expense.narration)
        .bind(expense.credit)
        .bind(expense.expense_date)
        .bind(expense.created_utc)
        .bind(expense.updated_utc)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to insert expense", e))?;
        Ok(())
    }

    async fn insert_account(conn: &mut PgConnection, account: &CoaAccount) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO coa_accounts (account_id, ac_name, ac_type, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.account_id)
        .bind(&account.ac_name)
        .bind(account.ac_type)
        .bind(account.created_utc)
        .bind(account.updated_utc)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to insert account", e))?;
        Ok(())
    }

    /// Attach lines to transaction rows, preserving row order.
    async fn with_lines<'e, E: PgExecutor<'e>>(
        executor: E,
        rows: Vec<TransactionRow>,
    ) -> Result<Vec<InventoryTransaction>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.transaction_id).collect();
        let line_rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT transaction_id, item_id, unit_price, com_qty, bonus_qty, line_total
            FROM inventory_transaction_items
            WHERE transaction_id = ANY($1)
            ORDER BY transaction_id, line_no
            "#,
        )
        .bind(&ids)
        .fetch_all(executor)
        .await
        .map_err(|e| db_error("Failed to load transaction lines", e))?;

        let mut lines: HashMap<Uuid, Vec<TransactionLine>> = HashMap::new();
        for row in line_rows {
            lines.entry(row.transaction_id).or_default().push(TransactionLine {
                item_id: row.item_id,
                unit_price: row.unit_price,
                com_qty: row.com_qty,
                bonus_qty: row.bonus_qty,
                line_total: row.line_total,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tx_lines = lines.remove(&row.transaction_id).unwrap_or_default();
                row.into_transaction(tx_lines)
            })
            .collect())
    }

    async fn load_account(conn: &mut PgConnection, party: &Party) -> Result<PartyAccount, AppError> {
        let party_id = party.party_id;
        let balance = sqlx::query_as::<_, PartyBalance>(&format!(
            "SELECT {} FROM party_balances WHERE party_id = $1",
            BALANCE_COLUMNS
        ))
        .bind(party_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to get balance", e))?
        .unwrap_or_else(|| PartyBalance::new(party_id, party.created_utc));

        let entries = sqlx::query_as::<_, PartyEntry>(&format!(
            "SELECT {} FROM party_entries WHERE party_id = $1 ORDER BY created_utc DESC, entry_id DESC",
            ENTRY_COLUMNS
        ))
        .bind(party_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to list party entries", e))?;

        Ok(PartyAccount { balance, entries })
    }
}

#[async_trait]
impl LedgerStore for Database {
    /// Check database health.
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Party Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(kind = %input.kind()))]
    async fn create_party(&self, input: PartyInput) -> Result<Party, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_party"])
            .start_timer();

        let mut tx = self.begin().await?;
        Self::check_party_input(&mut tx, &input).await?;

        let now = Utc::now();
        let party = Party {
            party_id: Uuid::new_v4(),
            contact: input.contact,
            profile: input.profile,
            created_utc: now,
            updated_utc: now,
        };
        Self::insert_party(&mut tx, &party).await?;
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit party", e))?;

        timer.observe_duration();
        info!(party_id = %party.party_id, "Party created");
        Ok(party)
    }

    #[instrument(skip(self, input), fields(party_id = %party_id))]
    async fn update_party(&self, party_id: Uuid, input: PartyInput) -> Result<Party, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_party"])
            .start_timer();

        let mut tx = self.begin().await?;
        let existing = sqlx::query_as::<_, PartyRow>(&format!(
            "SELECT {} FROM parties WHERE party_id = $1 FOR UPDATE",
            PARTY_COLUMNS
        ))
        .bind(party_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to get party", e))?
        .ok_or_else(|| LedgerError::not_found("Party", party_id))?;

        if existing.kind != input.kind() {
            return Err(LedgerError::Validation(format!(
                "Party {} is a {} and cannot become a {}",
                party_id,
                existing.kind,
                input.kind()
            ))
            .into());
        }
        Self::check_party_input(&mut tx, &input).await?;

        let (area_name, salesman_id, address) = profile_columns(&input.profile);
        let row = sqlx::query_as::<_, PartyRow>(&format!(
            r#"
            UPDATE parties SET
                name_full = $2, name_short = $3, email1 = $4, email2 = $5, email3 = $6,
                phone1 = $7, phone2 = $8, phone3 = $9, area_name = $10, salesman_id = $11,
                address = $12, updated_utc = NOW()
            WHERE party_id = $1
            RETURNING {}
            "#,
            PARTY_COLUMNS
        ))
        .bind(party_id)
        .bind(&input.contact.name_full)
        .bind(&input.contact.name_short)
        .bind(&input.contact.email1)
        .bind(&input.contact.email2)
        .bind(&input.contact.email3)
        .bind(&input.contact.phone1)
        .bind(&input.contact.phone2)
        .bind(&input.contact.phone3)
        .bind(area_name)
        .bind(salesman_id)
        .bind(address)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to update party", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit party", e))?;
        timer.observe_duration();

        Party::try_from(row)
    }

    #[instrument(skip(self), fields(party_id = %party_id))]
    async fn get_party(&self, party_id: Uuid) -> Result<Option<Party>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_party"])
            .start_timer();
        let party = Self::fetch_party(&self.pool, party_id).await?;
        timer.observe_duration();
        Ok(party)
    }

    #[instrument(skip(self), fields(kind = %kind))]
    async fn list_parties(&self, kind: PartyKind) -> Result<Vec<Party>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_parties"])
            .start_timer();
        let rows = sqlx::query_as::<_, PartyRow>(&format!(
            "SELECT {} FROM parties WHERE kind = $1 ORDER BY created_utc",
            PARTY_COLUMNS
        ))
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list parties", e))?;
        timer.observe_duration();

        rows.into_iter().map(Party::try_from).collect()
    }

    #[instrument(skip(self), fields(salesman_id = %salesman_id))]
    async fn list_salesman_customers(&self, salesman_id: Uuid) -> Result<Vec<Party>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_salesman_customers"])
            .start_timer();
        let rows = sqlx::query_as::<_, PartyRow>(&format!(
            "SELECT {} FROM parties WHERE salesman_id = $1 ORDER BY created_utc",
            PARTY_COLUMNS
        ))
        .bind(salesman_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list customers", e))?;
        timer.observe_duration();

        rows.into_iter().map(Party::try_from).collect()
    }

    // -------------------------------------------------------------------------
    // Item Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(company_id = %input.company_id))]
    async fn create_item(&self, input: ItemInput) -> Result<Item, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_item"])
            .start_timer();

        let mut tx = self.begin().await?;
        Self::require_party(&mut tx, input.company_id, PartyKind::Company).await?;

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
        Self::insert_item(&mut tx, &item).await?;
        Self::write_stock(&mut tx, &StockRecord::new(item.item_id, item.sale_price)).await?;
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit item", e))?;

        timer.observe_duration();
        info!(item_id = %item.item_id, "Item created");
        Ok(item)
    }

    #[instrument(skip(self, input), fields(item_id = %item_id))]
    async fn update_item(&self, item_id: Uuid, input: ItemInput) -> Result<Item, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_item"])
            .start_timer();

        let mut tx = self.begin().await?;
        Self::require_party(&mut tx, input.company_id, PartyKind::Company).await?;

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items SET
                name_full = $2, name_short = $3, purchase_price = $4, sale_price = $5,
                units_in_carton = $6, company_id = $7, updated_utc = NOW()
            WHERE item_id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(&input.name_full)
        .bind(&input.name_short)
        .bind(input.purchase_price)
        .bind(input.sale_price)
        .bind(input.units_in_carton)
        .bind(input.company_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to update item", e))?
        .ok_or_else(|| LedgerError::not_found("Item", item_id))?;

        sqlx::query(
            r#"
            INSERT INTO stock (item_id, sale_price) VALUES ($1, $2)
            ON CONFLICT (item_id) DO UPDATE SET sale_price = EXCLUDED.sale_price, updated_utc = NOW()
            "#,
        )
        .bind(item_id)
        .bind(item.sale_price)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to refresh stock price", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit item", e))?;
        timer.observe_duration();

        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, AppError> {
        sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE item_id = $1",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get item", e))
    }

    #[instrument(skip(self))]
    async fn list_items(&self, company_id: Option<Uuid>) -> Result<Vec<Item>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items"])
            .start_timer();
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE ($1::uuid IS NULL OR company_id = $1) ORDER BY name_full",
            ITEM_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list items", e))?;
        timer.observe_duration();
        Ok(items)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn get_stock(&self, item_id: Uuid) -> Result<Option<StockRecord>, AppError> {
        sqlx::query_as::<_, StockRecord>(
            "SELECT item_id, com_qty, bonus_qty, sale_price, updated_utc FROM stock WHERE item_id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get stock", e))
    }

    // -------------------------------------------------------------------------
    // Inventory Transaction Operations
    // -------------------------------------------------------------------------

    /// Post an invoice or return in one database transaction.
    ///
    /// Lock order: stock rows by ascending item id, then the type counter,
    /// then the party balance.
    #[instrument(
        skip(self, draft),
        fields(transaction_type = %draft.transaction_type, party_id = %draft.party_id, line_count = draft.lines.len())
    )]
    async fn post_inventory_transaction(
        &self,
        draft: InvoiceDraft,
        policy: ReturnCreditPolicy,
    ) -> Result<InventoryTransaction, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["post_inventory_transaction"])
            .start_timer();

        draft.validate()?;
        let mut tx = self.begin().await?;

        Self::require_party(&mut tx, draft.party_id, draft.transaction_type.party_kind()).await?;
        if let Some(salesman_id) = draft.salesman_id {
            Self::require_party(&mut tx, salesman_id, PartyKind::Salesman).await?;
        }

        let item_ids = draft.item_ids();
        let mut stock: HashMap<Uuid, StockRecord> = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT item_id, com_qty, bonus_qty, sale_price, updated_utc
            FROM stock
            WHERE item_id = ANY($1)
            ORDER BY item_id
            FOR UPDATE
            "#,
        )
        .bind(&item_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock stock", e))?
        .into_iter()
        .map(|r| (r.item_id, r))
        .collect();

        let items: HashMap<Uuid, Item> = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE item_id = ANY($1)",
            ITEM_COLUMNS
        ))
        .bind(&item_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to load items", e))?
        .into_iter()
        .map(|i| (i.item_id, i))
        .collect();

        let plan = PostingPlan::build(&draft, &items)?;

        let mut touched = Vec::with_capacity(plan.stock_deltas.len());
        for (item_id, delta) in &plan.stock_deltas {
            let mut record = match stock.remove(item_id) {
                Some(record) => record,
                None => StockRecord::new(
                    *item_id,
                    items.get(item_id).map(|i| i.sale_price).unwrap_or_default(),
                ),
            };
            record.apply(*delta)?;
            if let Some(update) = plan.price_updates.iter().find(|u| u.item_id == *item_id) {
                record.sale_price = update.sale_price;
            }
            touched.push(record);
        }

        let transaction_no: i64 = sqlx::query_scalar(
            "UPDATE transaction_counters SET last_no = last_no + 1 WHERE transaction_type = $1 RETURNING last_no",
        )
        .bind(plan.transaction_type)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to allocate transaction number", e))?;

        let now = Utc::now();
        let transaction_id = Uuid::new_v4();
        let mut balance = Self::lock_balance(&mut tx, plan.party_id).await?;
        let entry = balance
            .apply_posting(&plan, transaction_id, transaction_no, policy)?
            .map(|e| e.into_entry(plan.party_id, now));
        let transaction = plan.to_transaction(transaction_id, transaction_no, now);

        for record in &touched {
            Self::write_stock(&mut tx, record).await?;
        }
        for update in &plan.price_updates {
            sqlx::query(
                "UPDATE items SET purchase_price = $2, sale_price = $3, updated_utc = NOW() WHERE item_id = $1",
            )
            .bind(update.item_id)
            .bind(update.purchase_price)
            .bind(update.sale_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to refresh item prices", e))?;
        }
        Self::insert_transaction(&mut tx, &transaction).await?;
        Self::write_balance(&mut tx, &balance).await?;
        if let Some(entry) = &entry {
            Self::insert_entry(&mut tx, entry).await?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit inventory transaction", e))?;
        timer.observe_duration();

        info!(
            transaction_id = %transaction.transaction_id,
            transaction_no = transaction.transaction_no,
            amount = %transaction.transaction_amount,
            "Inventory transaction posted"
        );

        Ok(transaction)
    }

    #[instrument(skip(self), fields(transaction_id = %transaction_id))]
    async fn get_inventory_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<InventoryTransaction>, AppError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM inventory_transactions WHERE transaction_id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get transaction", e))?;

        match row {
            Some(row) => Ok(Self::with_lines(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filter))]
    async fn list_inventory_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<InventoryTransaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_inventory_transactions"])
            .start_timer();

        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {} FROM inventory_transactions t
            WHERE ($1::smallint IS NULL OR t.transaction_type = $1)
              AND ($2::uuid IS NULL OR t.party_id = $2)
              AND ($3::uuid IS NULL OR t.salesman_id = $3)
              AND ($4::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM inventory_transaction_items i
                    WHERE i.transaction_id = t.transaction_id AND i.item_id = $4))
              AND ($5::date IS NULL OR t.transaction_date >= $5)
              AND ($6::date IS NULL OR t.transaction_date <= $6)
            ORDER BY t.transaction_date DESC, t.transaction_no DESC, t.created_utc DESC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(filter.transaction_type)
        .bind(filter.party_id)
        .bind(filter.salesman_id)
        .bind(filter.item_id)
        .bind(filter.range.map(|r| r.from()))
        .bind(filter.range.map(|r| r.to()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list transactions", e))?;

        let transactions = Self::with_lines(&self.pool, rows).await?;
        timer.observe_duration();
        Ok(transactions)
    }

    // -------------------------------------------------------------------------
    // Party Account Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self), fields(party_id = %party_id))]
    async fn get_party_account(&self, party_id: Uuid) -> Result<PartyAccount, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_party_account"])
            .start_timer();

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        let party = Self::fetch_party(&mut *conn, party_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Party", party_id))?;
        let account = Self::load_account(&mut conn, &party).await?;

        timer.observe_duration();
        Ok(account)
    }

    #[instrument(skip(self), fields(party_id = %party_id, amount = %amount))]
    async fn receive_cash(
        &self,
        party_id: Uuid,
        expected_kind: PartyKind,
        amount: Decimal,
    ) -> Result<PartyAccount, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["receive_cash"])
            .start_timer();

        let mut tx = self.begin().await?;
        let party = Self::require_party(&mut tx, party_id, expected_kind).await?;

        let mut balance = Self::lock_balance(&mut tx, party_id).await?;
        let entry = balance.receive_cash(amount)?.into_entry(party_id, Utc::now());
        Self::write_balance(&mut tx, &balance).await?;
        Self::insert_entry(&mut tx, &entry).await?;
        let account = Self::load_account(&mut tx, &party).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit cash receipt", e))?;
        timer.observe_duration();
        Ok(account)
    }

    #[instrument(skip(self, message), fields(party_id = %party_id, amount = %amount))]
    async fn add_credit(
        &self,
        party_id: Uuid,
        amount: Decimal,
        message: String,
    ) -> Result<PartyAccount, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["add_credit"])
            .start_timer();

        let mut tx = self.begin().await?;
        let party = Self::require_party(&mut tx, party_id, PartyKind::Customer).await?;

        let mut balance = Self::lock_balance(&mut tx, party_id).await?;
        let entry = balance
            .add_credit(amount, &message)?
            .into_entry(party_id, Utc::now());
        Self::write_balance(&mut tx, &balance).await?;
        Self::insert_entry(&mut tx, &entry).await?;
        let account = Self::load_account(&mut tx, &party).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit credit", e))?;
        timer.observe_duration();
        Ok(account)
    }

    // -------------------------------------------------------------------------
    // Chart of Accounts Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(ac_type = %input.ac_type))]
    async fn create_account(&self, input: NewAccount) -> Result<CoaAccount, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_account"])
            .start_timer();
        let now = Utc::now();
        let account = CoaAccount {
            account_id: Uuid::new_v4(),
            ac_name: input.ac_name,
            ac_type: input.ac_type,
            created_utc: now,
            updated_utc: now,
        };
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        Self::insert_account(&mut conn, &account).await?;
        timer.observe_duration();

        info!(account_id = %account.account_id, "Account created");
        Ok(account)
    }

    #[instrument(skip(self, ac_name), fields(account_id = %account_id))]
    async fn rename_account(
        &self,
        account_id: Uuid,
        ac_name: String,
    ) -> Result<CoaAccount, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["rename_account"])
            .start_timer();
        let account = sqlx::query_as::<_, CoaAccount>(
            r#"
            UPDATE coa_accounts SET ac_name = $2, updated_utc = NOW()
            WHERE account_id = $1
            RETURNING account_id, ac_name, ac_type, created_utc, updated_utc
            "#,
        )
        .bind(account_id)
        .bind(&ac_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to rename account", e))?
        .ok_or_else(|| LedgerError::not_found("Account", account_id))?;
        timer.observe_duration();
        Ok(account)
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn get_account(&self, account_id: Uuid) -> Result<Option<CoaAccount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_account"])
            .start_timer();
        let account = sqlx::query_as::<_, CoaAccount>(
            "SELECT account_id, ac_name, ac_type, created_utc, updated_utc FROM coa_accounts WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get account", e))?;
        timer.observe_duration();
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn list_accounts(
        &self,
        ac_type: Option<AccountType>,
    ) -> Result<Vec<CoaAccount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_accounts"])
            .start_timer();
        let accounts = sqlx::query_as::<_, CoaAccount>(
            r#"
            SELECT account_id, ac_name, ac_type, created_utc, updated_utc
            FROM coa_accounts
            WHERE ($1::smallint IS NULL OR ac_type = $1)
            ORDER BY ac_name
            "#,
        )
        .bind(ac_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list accounts", e))?;
        timer.observe_duration();
        Ok(accounts)
    }

    // -------------------------------------------------------------------------
    // Expense Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(account_id = %input.account_id))]
    async fn create_expense(&self, input: ExpenseInput) -> Result<Expense, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_expense"])
            .start_timer();

        let mut tx = self.begin().await?;
        let account = sqlx::query_as::<_, CoaAccount>(
            "SELECT account_id, ac_name, ac_type, created_utc, updated_utc FROM coa_accounts WHERE account_id = $1 FOR SHARE",
        )
        .bind(input.account_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to get account", e))?
        .ok_or_else(|| LedgerError::not_found("Account", input.account_id))?;
        ensure_expense_account(&account)?;
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
        Self::insert_expense(&mut tx, &expense).await?;
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit expense", e))?;

        timer.observe_duration();
        info!(expense_id = %expense.expense_id, "Expense recorded");
        Ok(expense)
    }

    #[instrument(skip(self, update), fields(expense_id = %expense_id))]
    async fn update_expense(
        &self,
        expense_id: Uuid,
        update: ExpenseUpdate,
    ) -> Result<Expense, AppError> {
        let mut tx = self.begin().await?;
        let existing = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {} FROM expenses WHERE expense_id = $1 FOR UPDATE",
            EXPENSE_COLUMNS
        ))
        .bind(expense_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to get expense", e))?
        .ok_or_else(|| LedgerError::not_found("Expense", expense_id))?;

        if update.account_id.is_some_and(|id| id != existing.account_id) {
            return Err(LedgerError::Validation(
                "An expense cannot be moved to another account".to_string(),
            )
            .into());
        }
        check_expense(update.amount, &update.narration)?;

        let expense = sqlx::query_as::<_, Expense>(&format!(
            "UPDATE expenses SET credit = $2, narration = $3, updated_utc = NOW() WHERE expense_id = $1 RETURNING {}",
            EXPENSE_COLUMNS
        ))
        .bind(expense_id)
        .bind(update.amount)
        .bind(&update.narration)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to update expense", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit expense", e))?;
        Ok(expense)
    }

    #[instrument(skip(self, filter))]
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_expenses"])
            .start_timer();
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {} FROM expenses
            WHERE ($1::uuid IS NULL OR account_id = $1)
              AND ($2::date IS NULL OR expense_date >= $2)
              AND ($3::date IS NULL OR expense_date <= $3)
            ORDER BY expense_date DESC, created_utc DESC
            "#,
            EXPENSE_COLUMNS
        ))
        .bind(filter.account_id)
        .bind(filter.range.map(|r| r.from()))
        .bind(filter.range.map(|r| r.to()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list expenses", e))?;
        timer.observe_duration();
        Ok(expenses)
    }

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------

    #[instrument(skip(self), fields(from = %range.from(), to = %range.to()))]
    async fn month_close(&self, range: DateRange) -> Result<MonthClose, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["month_close"])
            .start_timer();

        let totals: Vec<(TransactionType, Decimal)> = sqlx::query_as(
            r#"
            SELECT transaction_type, COALESCE(SUM(transaction_amount), 0)
            FROM inventory_transactions
            WHERE transaction_date BETWEEN $1 AND $2
            GROUP BY transaction_type
            "#,
        )
        .bind(range.from())
        .bind(range.to())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to total transactions", e))?;

        let expenses: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(credit), 0) FROM expenses WHERE expense_date BETWEEN $1 AND $2",
        )
        .bind(range.from())
        .bind(range.to())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to total expenses", e))?;

        let mut close = MonthClose::default();
        for (transaction_type, amount) in totals {
            close.add_transaction(transaction_type, amount);
        }
        close.add_expense(expenses);

        timer.observe_duration();
        Ok(close)
    }

    // -------------------------------------------------------------------------
    // Backup
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn export_snapshot(&self) -> Result<Snapshot, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["export_snapshot"])
            .start_timer();

        let mut tx = self.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to start snapshot", e))?;

        let parties = sqlx::query_as::<_, PartyRow>(&format!(
            "SELECT {} FROM parties ORDER BY created_utc",
            PARTY_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to export parties", e))?
        .into_iter()
        .map(Party::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let items = sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items", ITEM_COLUMNS))
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to export items", e))?;

        let stock = sqlx::query_as::<_, StockRecord>(
            "SELECT item_id, com_qty, bonus_qty, sale_price, updated_utc FROM stock",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to export stock", e))?;

        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM inventory_transactions ORDER BY transaction_type, transaction_no",
            TRANSACTION_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to export transactions", e))?;
        let transactions = Self::with_lines(&mut *tx, rows).await?;

        let counters = sqlx::query_as::<_, (TransactionType, i64)>(
            "SELECT transaction_type, last_no FROM transaction_counters ORDER BY transaction_type",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to export counters", e))?
        .into_iter()
        .map(|(transaction_type, last_no)| TransactionCounter {
            transaction_type,
            last_no,
        })
        .collect();

        let balances = sqlx::query_as::<_, PartyBalance>(&format!(
            "SELECT {} FROM party_balances",
            BALANCE_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to export balances", e))?;

        let entries = sqlx::query_as::<_, PartyEntry>(&format!(
            "SELECT {} FROM party_entries ORDER BY created_utc",
            ENTRY_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to export entries", e))?;

        let accounts = sqlx::query_as::<_, CoaAccount>(
            "SELECT account_id, ac_name, ac_type, created_utc, updated_utc FROM coa_accounts",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to export accounts", e))?;

        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {} FROM expenses",
            EXPENSE_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to export expenses", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to finish snapshot", e))?;
        timer.observe_duration();

        Ok(Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: Utc::now(),
            parties,
            items,
            stock,
            transactions,
            counters,
            balances,
            entries,
            accounts,
            expenses,
        })
    }

    #[instrument(skip(self, snapshot))]
    async fn import_snapshot(&self, snapshot: Snapshot) -> Result<RestoreCounts, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["import_snapshot"])
            .start_timer();

        snapshot.validate()?;
        let counts = snapshot.counts();

        let mut tx = self.begin().await?;
        sqlx::query(
            r#"
            TRUNCATE party_entries, party_balances, inventory_transaction_items,
                     inventory_transactions, stock, items, expenses, coa_accounts, parties
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to clear ledger", e))?;
        sqlx::query("UPDATE transaction_counters SET last_no = 0")
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to reset counters", e))?;

        // Salesmen and companies first so customer and item references resolve.
        let mut parties: Vec<&Party> = snapshot.parties.iter().collect();
        parties.sort_by_key(|p| p.kind() == PartyKind::Customer);
        for party in parties {
            Self::insert_party(&mut tx, party).await?;
        }
        for item in &snapshot.items {
            Self::insert_item(&mut tx, item).await?;
        }
        for record in &snapshot.stock {
            Self::write_stock(&mut tx, record).await?;
        }
        for transaction in &snapshot.transactions {
            Self::insert_transaction(&mut tx, transaction).await?;
        }
        for counter in &snapshot.counters {
            sqlx::query("UPDATE transaction_counters SET last_no = $2 WHERE transaction_type = $1")
                .bind(counter.transaction_type)
                .bind(counter.last_no)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to restore counter", e))?;
        }
        for balance in &snapshot.balances {
            Self::write_balance(&mut tx, balance).await?;
        }
        for entry in &snapshot.entries {
            Self::insert_entry(&mut tx, entry).await?;
        }
        for account in &snapshot.accounts {
            Self::insert_account(&mut tx, account).await?;
        }
        for expense in &snapshot.expenses {
            Self::insert_expense(&mut tx, expense).await?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit restore", e))?;
        timer.observe_duration();

        info!(?counts, "Snapshot restored");
        Ok(counts)
    }
}
