use chrono::Local;
use serde_json::Value;
use uuid::Uuid;

use super::document::{encode, Document, Fields, Patch};
use super::path::projects;
use super::Database;
use crate::error::{Error, Result};
use crate::models::{CreateProjectInput, Project, UpdateProjectInput};
use crate::timestamps::add_timestamps;

const ACHIEVEMENTS: &str = "achievements";

impl Database {
    pub async fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let id = Uuid::new_v4().to_string();
        let mut fields = encode(&input)?;
        fields.insert(ACHIEVEMENTS.to_string(), Value::Array(Vec::new()));
        let fields = add_timestamps(fields, false);

        self.gateway.set(&projects().doc(&id), fields.clone()).await?;
        tracing::info!(project_id = %id, name = %input.name, "project created");

        Ok(Document::new(id, fields).decode()?)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let docs = self.gateway.get_all(&projects()).await?;
        docs.iter()
            .map(|doc| doc.decode().map_err(Error::from))
            .collect()
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        if !super::is_valid_id(project_id) {
            return Err(Error::project_not_found(project_id));
        }
        match self.gateway.get(&projects().doc(project_id)).await? {
            Some(doc) => Ok(doc.decode()?),
            None => Err(Error::project_not_found(project_id)),
        }
    }

    /// Fails with `NotFound` unless the project exists.
    pub async fn ensure_project(&self, project_id: &str) -> Result<()> {
        if self.gateway.exists(&projects(), project_id).await? {
            Ok(())
        } else {
            Err(Error::project_not_found(project_id))
        }
    }

    pub async fn update_project(&self, project_id: &str, input: UpdateProjectInput) -> Result<Project> {
        self.ensure_project(project_id).await?;

        let fields = encode(&input)?;
        if fields.is_empty() {
            return Err(Error::NothingToUpdate);
        }
        let fields = add_timestamps(fields, true);

        self.gateway
            .update(&projects().doc(project_id), Patch::from_fields(fields))
            .await?;
        tracing::info!(project_id, "project updated");

        self.get_project(project_id).await
    }

    /// Append a date-prefixed achievement; returns the stored entry.
    ///
    /// The append is a store-side array union, so concurrent appends never
    /// overwrite each other.
    pub async fn add_achievement(&self, project_id: &str, achievement: &str) -> Result<String> {
        self.ensure_project(project_id).await?;

        let entry = format!("[{}] {}", Local::now().format("%Y-%m-%d"), achievement);
        let patch = Patch::from_fields(add_timestamps(Fields::new(), true))
            .array_union(ACHIEVEMENTS, vec![Value::String(entry.clone())]);

        self.gateway.update(&projects().doc(project_id), patch).await?;
        tracing::info!(project_id, achievement = %entry, "achievement added");

        Ok(entry)
    }
}
