use crate::dtos::{
    required, InvoiceResponse, ItemInvoicesQuery, PartyInvoicesQuery, PurchaseInvoiceRequest,
    SaleReturnRequest, SalesInvoiceRequest, SalesmanInvoicesQuery,
};
use crate::models::TransactionType;
use crate::services::InvoiceDetails;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use service_core::error::AppError;
use uuid::Uuid;

fn created(details: InvoiceDetails) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "invoice": InvoiceResponse::from(details) })),
    )
}

fn invoices(list: Vec<InvoiceDetails>) -> Json<serde_json::Value> {
    let invoices: Vec<InvoiceResponse> = list.into_iter().map(InvoiceResponse::from).collect();
    Json(json!({ "invoices": invoices }))
}

pub async fn post_purchase_invoice(
    State(state): State<AppState>,
    Json(req): Json<PurchaseInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = req.into_draft(Utc::now().date_naive())?;
    Ok(created(state.inventory.post(draft).await?))
}

pub async fn post_sales_invoice(
    State(state): State<AppState>,
    Json(req): Json<SalesInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = req.into_draft()?;
    Ok(created(state.inventory.post(draft).await?))
}

pub async fn post_sale_return(
    State(state): State<AppState>,
    Json(req): Json<SaleReturnRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = req.into_draft(Utc::now().date_naive())?;
    Ok(created(state.inventory.post(draft).await?))
}

pub async fn list_purchase_invoices(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let list = state
        .inventory
        .list_invoices(TransactionType::PurchaseInvoice)
        .await?;
    Ok(invoices(list))
}

pub async fn list_sales_invoices(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let list = state
        .inventory
        .list_invoices(TransactionType::SalesInvoice)
        .await?;
    Ok(invoices(list))
}

pub async fn list_sale_returns(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let list = state
        .inventory
        .list_invoices(TransactionType::SaleReturn)
        .await?;
    Ok(invoices(list))
}

pub async fn get_purchase_invoice(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let details = state
        .inventory
        .get_invoice(transaction_id, &[TransactionType::PurchaseInvoice])
        .await?;
    Ok(Json(json!({ "invoice": InvoiceResponse::from(details) })))
}

/// Sales invoices and sale returns share the `/sale/:id` route.
pub async fn get_sale_invoice(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let details = state
        .inventory
        .get_invoice(
            transaction_id,
            &[TransactionType::SalesInvoice, TransactionType::SaleReturn],
        )
        .await?;
    Ok(Json(json!({ "invoice": InvoiceResponse::from(details) })))
}

pub async fn list_by_item(
    State(state): State<AppState>,
    Query(params): Query<ItemInvoicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = required(params.item_id, "itemID")?;
    let list = state
        .inventory
        .list_by_item(item_id, params.invoice_type()?, params.dates.range()?)
        .await?;
    Ok(invoices(list))
}

pub async fn list_by_customer(
    State(state): State<AppState>,
    Query(params): Query<PartyInvoicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = required(params.customer_id, "customerID")?;
    let list = state
        .inventory
        .list_by_customer(customer_id, params.dates.range()?)
        .await?;
    Ok(invoices(list))
}

pub async fn list_by_company(
    State(state): State<AppState>,
    Query(params): Query<PartyInvoicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let company_id = required(params.company_id, "companyID")?;
    let list = state
        .inventory
        .list_by_company(company_id, params.dates.range()?)
        .await?;
    Ok(invoices(list))
}

pub async fn list_by_salesman(
    State(state): State<AppState>,
    Query(params): Query<SalesmanInvoicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let salesman_id = required(params.salesman_id, "salesmanID")?;
    let list = state
        .inventory
        .list_by_salesman(salesman_id, params.dates.range()?, params.product()?)
        .await?;
    Ok(invoices(list))
}
