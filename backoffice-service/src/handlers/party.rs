use crate::dtos::{PartyRequest, PartyResponse};
use crate::models::PartyKind;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

pub async fn create_party(
    State(state): State<AppState>,
    Json(req): Json<PartyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let party = state.directory.create_party(req.into_input()?).await?;
    tracing::info!(party_id = %party.party_id, kind = %party.kind(), "Party created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "party": PartyResponse::from(party) })),
    ))
}

pub async fn update_party(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
    Json(req): Json<PartyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let party = state
        .directory
        .update_party(party_id, req.into_input()?)
        .await?;
    Ok(Json(json!({ "party": PartyResponse::from(party) })))
}

pub async fn get_party(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let party = state.directory.get_party(party_id).await?;
    Ok(Json(json!({ "party": PartyResponse::from(party) })))
}

async fn list_of_kind(
    state: &AppState,
    kind: PartyKind,
) -> Result<Json<serde_json::Value>, AppError> {
    let parties: Vec<PartyResponse> = state
        .directory
        .list_parties(kind)
        .await?
        .into_iter()
        .map(PartyResponse::from)
        .collect();
    Ok(Json(json!({ "parties": parties })))
}

pub async fn list_customers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    list_of_kind(&state, PartyKind::Customer).await
}

pub async fn list_salesmen(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    list_of_kind(&state, PartyKind::Salesman).await
}

pub async fn list_companies(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    list_of_kind(&state, PartyKind::Company).await
}

pub async fn list_salesman_customers(
    State(state): State<AppState>,
    Path(salesman_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customers: Vec<PartyResponse> = state
        .directory
        .list_salesman_customers(salesman_id)
        .await?
        .into_iter()
        .map(PartyResponse::from)
        .collect();
    Ok(Json(json!({ "customers": customers })))
}
