use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use issue_tracker_core::models::CreateResolutionInput;
use serde_json::{json, Value};

use super::{ApiError, AppState};

pub async fn add_resolution(
    State(state): State<AppState>,
    payload: Result<Json<CreateResolutionInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = payload?;
    let resolution = state.db.add_resolution(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Resolution logged and issue marked as resolved.",
            "resolution_id": resolution.id,
        })),
    ))
}

pub async fn list_resolutions(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let resolutions = state.db.list_resolutions(&issue_id).await?;
    Ok(Json(json!({ "resolutions": resolutions })))
}
