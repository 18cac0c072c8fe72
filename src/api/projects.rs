use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use issue_tracker_core::models::{AddAchievementInput, CreateProjectInput, Project, UpdateProjectInput};
use serde_json::{json, Value};

use super::{ApiError, AppState};

pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<CreateProjectInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = payload?;
    let project = state.db.create_project(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Project created successfully",
            "project_id": project.id,
        })),
    ))
}

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let projects = state.db.list_projects().await?;
    Ok(Json(json!({ "projects": projects })))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.db.get_project(&project_id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<UpdateProjectInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let project = state.db.update_project(&project_id, input).await?;

    Ok(Json(json!({
        "message": format!("Project {project_id} updated successfully"),
        "project": project,
    })))
}

pub async fn add_achievement(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<AddAchievementInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let achievement = state
        .db
        .add_achievement(&project_id, &input.new_achievement)
        .await?;

    Ok(Json(json!({
        "message": "Achievement added successfully",
        "achievement": achievement,
    })))
}
