//! Axum route handlers proxying CV-file management to the upload service.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::models::profile::CvFileRecord;
use crate::remote::{BearerToken, CvUpload};
use crate::state::AppState;

/// GET /api/v1/cv
pub async fn handle_list(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<Vec<CvFileRecord>>, AppError> {
    Ok(Json(state.cv_files.list(&token).await?))
}

/// POST /api/v1/cv
///
/// Multipart form with a `file` part and an optional `cvName` text part.
pub async fn handle_upload(
    State(state): State<AppState>,
    token: BearerToken,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut file: Option<(String, Option<String>, bytes::Bytes)> = None;
    let mut cv_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("cv.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file part: {e}")))?;
                file = Some((file_name, content_type, bytes));
            }
            Some("cvName") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid cvName part: {e}")))?;
                cv_name = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::Validation("file part is required".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("file is empty".to_string()));
    }

    info!("Forwarding CV upload '{file_name}' ({} bytes)", bytes.len());
    let created = state
        .cv_files
        .upload(
            &token,
            CvUpload {
                file_name,
                content_type,
                bytes,
                cv_name,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/cv/:cv_id/default
pub async fn handle_set_default(
    State(state): State<AppState>,
    Path(cv_id): Path<String>,
    token: BearerToken,
) -> Result<StatusCode, AppError> {
    state.cv_files.set_default(&token, &cv_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/cv/:cv_id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(cv_id): Path<String>,
    token: BearerToken,
) -> Result<StatusCode, AppError> {
    state.cv_files.delete(&token, &cv_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
