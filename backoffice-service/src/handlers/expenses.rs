use crate::dtos::{
    required_range, AccountRequest, DateFilter, ExpenseAccountResponse, ExpenseRequest,
    ExpenseResponse, ExpenseUpdateRequest, MonthCloseQuery, MonthCloseResponse,
};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;
use uuid::Uuid;

pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<AccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.expenses.create_account(req.into_account()?).await?;
    tracing::info!(account_id = %account.account_id, "Expense account created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "expenseAccount": ExpenseAccountResponse::from(account) })),
    ))
}

pub async fn rename_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(req): Json<AccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .expenses
        .rename_account(account_id, &req.ac_name)
        .await?;
    Ok(Json(
        json!({ "expenseAccount": ExpenseAccountResponse::from(account) }),
    ))
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let accounts: Vec<ExpenseAccountResponse> = state
        .expenses
        .list_accounts()
        .await?
        .into_iter()
        .map(ExpenseAccountResponse::from)
        .collect();
    Ok(Json(json!({ "expenseAccounts": accounts })))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(req): Json<ExpenseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let expense = state.expenses.create_expense(req.into_input()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "expense": ExpenseResponse::from(expense) })),
    ))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
    Json(req): Json<ExpenseUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let expense = state
        .expenses
        .update_expense(expense_id, req.into_update()?)
        .await?;
    Ok(Json(json!({ "expense": ExpenseResponse::from(expense) })))
}

fn expense_list(expenses: Vec<crate::models::Expense>) -> Json<serde_json::Value> {
    let expenses: Vec<ExpenseResponse> = expenses.into_iter().map(ExpenseResponse::from).collect();
    Json(json!({ "expenses": expenses }))
}

pub async fn list_expenses(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(expense_list(state.expenses.list_expenses().await?))
}

pub async fn list_expenses_by_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(dates): Query<DateFilter>,
) -> Result<impl IntoResponse, AppError> {
    let expenses = state
        .expenses
        .list_by_account(account_id, dates.range()?)
        .await?;
    Ok(expense_list(expenses))
}

pub async fn month_close(
    State(state): State<AppState>,
    Query(params): Query<MonthCloseQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = required_range(params.date_from, params.date_to)?;
    let close = state.reports.month_close(range).await?;
    Ok(Json(json!({ "data": MonthCloseResponse::from(close) })))
}
