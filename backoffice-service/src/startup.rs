//! Application startup and lifecycle management.

use crate::config::{BackofficeConfig, DatabaseBackend};
use crate::handlers::{self, accounts, backup, expenses, inventory, item, party};
use crate::services::{
    AccountAggregator, BackupService, Database, Directory, ExpenseLedger, InventoryEngine,
    LedgerStore, MemoryStore, MonthCloseReporter,
};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{make_request_span, request_id_middleware, REQUEST_ID_HEADER},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Largest backup archive accepted by the import route.
const MAX_ARCHIVE_BYTES: usize = 64 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: BackofficeConfig,
    pub store: Arc<dyn LedgerStore>,
    pub directory: Directory,
    pub inventory: InventoryEngine,
    pub accounts: AccountAggregator,
    pub expenses: ExpenseLedger,
    pub reports: MonthCloseReporter,
    pub backup: BackupService,
}

impl AppState {
    /// Wire every engine to one store handle.
    pub fn new(config: BackofficeConfig, store: Arc<dyn LedgerStore>) -> Self {
        Self {
            directory: Directory::new(store.clone()),
            inventory: InventoryEngine::new(store.clone(), config.return_credit_policy),
            accounts: AccountAggregator::new(store.clone()),
            expenses: ExpenseLedger::new(store.clone()),
            reports: MonthCloseReporter::new(store.clone()),
            backup: BackupService::new(store.clone()),
            store,
            config,
        }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Party directory
        .route("/party", post(party::create_party))
        .route("/party/customer", get(party::list_customers))
        .route("/party/salesman", get(party::list_salesmen))
        .route("/party/company", get(party::list_companies))
        .route(
            "/party/salesman/:id/customers",
            get(party::list_salesman_customers),
        )
        .route("/party/:id", get(party::get_party).put(party::update_party))
        // Item catalog and stock
        .route("/item", get(item::list_items).post(item::create_item))
        .route("/item/:id", get(item::get_item).put(item::update_item))
        .route("/stock", get(item::get_stock))
        // Inventory transactions
        .route(
            "/inventoryTransaction/purchaseInvoice",
            get(inventory::list_purchase_invoices).post(inventory::post_purchase_invoice),
        )
        .route(
            "/inventoryTransaction/salesInvoice",
            get(inventory::list_sales_invoices).post(inventory::post_sales_invoice),
        )
        .route(
            "/inventoryTransaction/saleReturn",
            get(inventory::list_sale_returns),
        )
        .route(
            "/inventoryTransaction/customer/return",
            post(inventory::post_sale_return),
        )
        .route(
            "/inventoryTransaction/purchase/:id",
            get(inventory::get_purchase_invoice),
        )
        .route(
            "/inventoryTransaction/sale/:id",
            get(inventory::get_sale_invoice),
        )
        .route("/inventoryTransaction/item", get(inventory::list_by_item))
        .route(
            "/inventoryTransaction/customer",
            get(inventory::list_by_customer),
        )
        .route(
            "/inventoryTransaction/company",
            get(inventory::list_by_company),
        )
        .route(
            "/inventoryTransaction/salesman",
            get(inventory::list_by_salesman),
        )
        // Party accounts
        .route(
            "/inventoryTransaction/customer/accountData",
            get(accounts::customer_account_data),
        )
        .route(
            "/inventoryTransaction/company/accountData",
            get(accounts::company_account_data),
        )
        .route(
            "/inventoryTransaction/customer/receiveCash",
            post(accounts::customer_receive_cash),
        )
        .route(
            "/inventoryTransaction/company/receiveCash",
            post(accounts::company_receive_cash),
        )
        .route(
            "/inventoryTransaction/customer/addCredit",
            post(accounts::customer_add_credit),
        )
        // Chart of accounts, expenses and month close
        .route(
            "/coa",
            get(expenses::list_accounts).post(expenses::create_account),
        )
        .route("/coa/:id", put(expenses::rename_account))
        .route(
            "/accountTransaction/expense/add",
            post(expenses::create_expense),
        )
        .route(
            "/accountTransaction/expense/update/:id",
            put(expenses::update_expense),
        )
        .route(
            "/accountTransaction/expense/list",
            get(expenses::list_expenses),
        )
        .route(
            "/accountTransaction/expense/list/:id",
            get(expenses::list_expenses_by_account),
        )
        .route("/accountTransaction/close", get(expenses::month_close))
        // Backup
        .route("/backup", get(backup::export_backup))
        .route(
            "/backup/import",
            post(backup::import_backup).layer(DefaultBodyLimit::max(MAX_ARCHIVE_BYTES)),
        )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([
            header::CONTENT_DISPOSITION,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// The full HTTP surface: health checks, metrics and the `/api/v1` API.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api/v1", api_routes())
        .route_layer(from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Open the store selected by `config`.
pub async fn connect_store(config: &BackofficeConfig) -> Result<Arc<dyn LedgerStore>, AppError> {
    match config.database.backend {
        DatabaseBackend::Postgres => {
            let url = config.database.url.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required for postgres"))
            })?;
            let db = Database::new(
                url.expose_secret(),
                config.database.max_connections,
                config.database.min_connections,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to PostgreSQL: {}", e);
                e
            })?;
            db.run_migrations().await.map_err(|e| {
                tracing::error!("Failed to run database migrations: {}", e);
                e
            })?;
            Ok(Arc::new(db))
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-process store; state is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Shutdown future for the server; resolves on Ctrl+C or SIGTERM.
pub type ShutdownSignal = std::pin::Pin<Box<dyn Future<Output = ()> + Send>>;

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    pub async fn build(config: BackofficeConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        let state = AppState::new(config.clone(), store);
        let router = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            backend = ?config.database.backend,
            return_credit_policy = config.return_credit_policy.as_str(),
            "Listening on {}",
            port
        );

        Ok(Self {
            port,
            listener,
            router,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown(self, signal: ShutdownSignal) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
