use crate::dtos::{required, ItemQuery, ItemRequest, ItemResponse, StockQuery, StockResponse};
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

pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<ItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.directory.create_item(req.into_input()?).await?;
    tracing::info!(item_id = %item.item_id, company_id = %item.company_id, "Item created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "item": ItemResponse::from(item) })),
    ))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(req): Json<ItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .directory
        .update_item(item_id, req.into_input()?)
        .await?;
    Ok(Json(json!({ "item": ItemResponse::from(item) })))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.directory.get_item(item_id).await?;
    Ok(Json(json!({ "item": ItemResponse::from(item) })))
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ItemQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items: Vec<ItemResponse> = state
        .directory
        .list_items(params.company_id)
        .await?
        .into_iter()
        .map(ItemResponse::from)
        .collect();
    Ok(Json(json!({ "items": items })))
}

pub async fn get_stock(
    State(state): State<AppState>,
    Query(params): Query<StockQuery>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = required(params.item_id, "itemID")?;
    let stock = state.directory.get_stock(item_id).await?;
    Ok(Json(json!({ "itemStock": StockResponse::from(stock) })))
}
