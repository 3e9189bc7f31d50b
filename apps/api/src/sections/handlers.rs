//! Axum route handlers for the CV sections API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv_sections::CvSections;
use crate::remote::BearerToken;
use crate::sections::editors::SectionEdit;
use crate::sections::notices::SyncOutcome;
use crate::sections::reconciler::CommitHandle;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CommitOptions {
    /// Await the remote write and report its outcome instead of detaching it.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub cv_sections: CvSections,
    pub sync_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOutcome>,
}

impl CommitResponse {
    async fn from_handle(handle: CommitHandle, options: &CommitOptions) -> Self {
        let sync_id = handle.sync_id;
        if options.wait {
            let (cv_sections, outcome) = handle.wait().await;
            CommitResponse {
                cv_sections,
                sync_id,
                sync: Some(outcome),
            }
        } else {
            CommitResponse {
                cv_sections: handle.detach(),
                sync_id,
                sync: None,
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub user_id: String,
    pub latest: Option<SyncOutcome>,
}

/// GET /api/v1/users/:user_id/cv-sections
pub async fn handle_load(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    token: BearerToken,
) -> Result<Json<CvSections>, AppError> {
    let sections = state.reconciler.load(&user_id, &token).await?;
    Ok(Json(sections))
}

/// PUT /api/v1/users/:user_id/cv-sections
///
/// Replaces the whole record. Returns once the local cache holds it; the
/// remote write continues in the background unless `?wait=true`.
pub async fn handle_commit(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(options): Query<CommitOptions>,
    token: BearerToken,
    Json(sections): Json<CvSections>,
) -> Result<(StatusCode, Json<CommitResponse>), AppError> {
    let handle = state.reconciler.commit(&user_id, &token, sections).await?;
    let response = CommitResponse::from_handle(handle, &options).await;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// POST /api/v1/users/:user_id/cv-sections/edits
pub async fn handle_edit(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(options): Query<CommitOptions>,
    token: BearerToken,
    Json(edit): Json<SectionEdit>,
) -> Result<(StatusCode, Json<CommitResponse>), AppError> {
    let handle = state.reconciler.apply_edit(&user_id, &token, edit).await?;
    let response = CommitResponse::from_handle(handle, &options).await;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /api/v1/users/:user_id/cv-sections/sync-status
pub async fn handle_sync_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    token: BearerToken,
) -> Result<Json<SyncStatusResponse>, AppError> {
    let latest = state.reconciler.sync_status(&user_id, &token).await?;
    Ok(Json(SyncStatusResponse { user_id, latest }))
}
