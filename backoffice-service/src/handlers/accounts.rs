use crate::dtos::{
    required, AddCreditRequest, CompanyAccountData, CompanyCashRequest, CompanyQuery,
    CustomerAccountData, CustomerCashRequest, CustomerQuery,
};
use crate::models::PartyKind;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

pub async fn customer_account_data(
    State(state): State<AppState>,
    Query(params): Query<CustomerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = required(params.customer_id, "customerID")?;
    let account = state
        .accounts
        .account_data(customer_id, PartyKind::Customer)
        .await?;
    Ok(Json(json!({ "data": CustomerAccountData::from(account) })))
}

pub async fn company_account_data(
    State(state): State<AppState>,
    Query(params): Query<CompanyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let company_id = required(params.company_id, "companyID")?;
    let account = state
        .accounts
        .account_data(company_id, PartyKind::Company)
        .await?;
    Ok(Json(json!({ "data": CompanyAccountData::from(account) })))
}

pub async fn customer_receive_cash(
    State(state): State<AppState>,
    Json(req): Json<CustomerCashRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (customer_id, amount) = req.into_parts()?;
    let account = state
        .accounts
        .receive_cash(customer_id, PartyKind::Customer, amount)
        .await?;
    Ok(Json(json!({ "data": CustomerAccountData::from(account) })))
}

pub async fn company_receive_cash(
    State(state): State<AppState>,
    Json(req): Json<CompanyCashRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (company_id, amount) = req.into_parts()?;
    let account = state
        .accounts
        .receive_cash(company_id, PartyKind::Company, amount)
        .await?;
    Ok(Json(json!({ "data": CompanyAccountData::from(account) })))
}

pub async fn customer_add_credit(
    State(state): State<AppState>,
    Json(req): Json<AddCreditRequest>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = required(req.customer_id, "customerID")?;
    let amount = required(req.amount, "amount")?;
    let account = state
        .accounts
        .add_credit(customer_id, amount, req.message)
        .await?;
    Ok(Json(json!({ "data": CustomerAccountData::from(account) })))
}
