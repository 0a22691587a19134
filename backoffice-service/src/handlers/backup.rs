use crate::startup::AppState;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use service_core::error::AppError;

/// Multipart field carrying the archive.
const ARCHIVE_FIELD: &str = "file";

pub async fn export_backup(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let archive = state.backup.export().await?;
    let disposition = format!(
        "attachment; filename=\"backoffice-backup-{}.json\"",
        Utc::now().format("%Y%m%d%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive,
    ))
}

pub async fn import_backup(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(ARCHIVE_FIELD) {
            continue;
        }
        let data = field.bytes().await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
        })?;
        let counts = state.backup.import(&data).await?;
        return Ok(Json(json!({ "restored": counts })));
    }
    Err(AppError::BadRequest(anyhow::anyhow!("No file uploaded")))
}
