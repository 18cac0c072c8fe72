use std::collections::HashMap;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use issue_tracker_core::models::{
    CreateIssueInput, Issue, IssueFilter, IssuePriority, IssueSeverity,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, AppState};

const SCREENSHOT_FIELD: &str = "screenshot";

struct Screenshot {
    bytes: Vec<u8>,
    filename: String,
    content_type: String,
}

/// Text fields and optional screenshot of an issue submission.
#[derive(Default)]
struct IssueForm {
    fields: HashMap<String, String>,
    screenshot: Option<Screenshot>,
}

impl IssueForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == SCREENSHOT_FIELD {
                let filename = field.file_name().unwrap_or("screenshot").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    form.screenshot = Some(Screenshot {
                        bytes: bytes.to_vec(),
                        filename,
                        content_type,
                    });
                }
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn required(&self, name: &str) -> Result<String, ApiError> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::Validation(format!("Missing form field '{name}'")))
    }

    fn input(&self) -> Result<CreateIssueInput, ApiError> {
        let severity = self.required("severity")?;
        let priority = self.required("priority")?;
        let frequency = self.required("frequency")?;

        Ok(CreateIssueInput {
            project_id: self.required("project_id")?,
            title: self.required("title")?,
            description: self.required("description")?,
            steps_to_reproduce: self.required("steps_to_reproduce")?,
            severity: IssueSeverity::from_str(&severity)
                .ok_or_else(|| ApiError::Validation(format!("Invalid severity '{severity}'")))?,
            priority: IssuePriority::from_str(&priority)
                .ok_or_else(|| ApiError::Validation(format!("Invalid priority '{priority}'")))?,
            reporter: self.required("reporter")?,
            frequency: frequency.trim().parse().map_err(|_| {
                ApiError::Validation(format!("Invalid frequency '{frequency}'"))
            })?,
        })
    }
}

pub async fn create_issue(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let form = IssueForm::read(&mut multipart).await?;
    let input = form.input()?;

    // Check the parent before paying for an upload.
    state.db.ensure_project(&input.project_id).await?;

    let screenshot_url = match form.screenshot {
        Some(shot) => Some(
            state
                .images
                .upload(shot.bytes, &shot.filename, &shot.content_type)
                .await?,
        ),
        None => None,
    };

    let issue = state.db.create_issue(input, screenshot_url).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Issue logged successfully",
            "issue_id": issue.id,
        })),
    ))
}

pub async fn list_issues(
    State(state): State<AppState>,
    filter: Result<Query<IssueFilter>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(filter) = filter?;
    let issues = state.db.list_issues(&filter).await?;
    Ok(Json(json!({ "issues": issues })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
}

pub async fn search_issues(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params?;
    let results = state.db.search_issues(&params.q).await?;
    Ok(Json(json!({ "results": results })))
}

pub async fn get_issue(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
) -> Result<Json<Issue>, ApiError> {
    Ok(Json(state.db.get_issue(&issue_id).await?))
}
