use serde_json::Value;

use super::document::{encode, Document, Filter};
use super::path::{issues, projects};
use super::Database;
use crate::error::{Error, Result};
use crate::ids::{generate_short_id, ISSUE_PREFIX};
use crate::models::{CreateIssueInput, Issue, IssueFilter, IssueStatus};
use crate::timestamps::add_timestamps;

pub const MIN_SEARCH_LEN: usize = 3;

impl Database {
    /// Write a new `Open` issue under its project.
    ///
    /// Nothing is written when the project does not exist.
    pub async fn create_issue(
        &self,
        input: CreateIssueInput,
        screenshot_url: Option<String>,
    ) -> Result<Issue> {
        self.ensure_project(&input.project_id).await?;

        let id = generate_short_id(ISSUE_PREFIX);
        let mut fields = encode(&input)?;
        fields.insert(
            "screenshot_url".to_string(),
            screenshot_url.map_or(Value::Null, Value::String),
        );
        fields.insert("status".to_string(), IssueStatus::Open.as_str().into());
        let fields = add_timestamps(fields, false);

        self.gateway
            .set(&issues(&input.project_id).doc(&id), fields.clone())
            .await?;
        tracing::info!(issue_id = %id, project_id = %input.project_id, "issue logged");

        Ok(Document::new(id, fields).decode()?)
    }

    /// Issues matching every filter that is set, across one or all projects.
    pub async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let project_ids = match &filter.project_id {
            Some(project_id) => {
                self.ensure_project(project_id).await?;
                vec![project_id.clone()]
            }
            None => self
                .gateway
                .get_all(&projects())
                .await?
                .into_iter()
                .map(|doc| doc.id)
                .collect(),
        };

        let mut filters = Vec::new();
        if let Some(status) = filter.status {
            filters.push(Filter::eq("status", status.as_str()));
        }
        if let Some(reporter) = &filter.reporter {
            filters.push(Filter::eq("reporter", reporter.as_str()));
        }

        let mut found = Vec::new();
        for project_id in project_ids {
            for doc in self.gateway.query(&issues(&project_id), &filters).await? {
                found.push(doc.decode()?);
            }
        }
        Ok(found)
    }

    /// Case-insensitive match on title or description substring, or on the exact id.
    ///
    /// The store only supports equality filters, so this scans every issue.
    pub async fn search_issues(&self, query: &str) -> Result<Vec<Issue>> {
        if query.chars().count() < MIN_SEARCH_LEN {
            return Err(Error::Validation(format!(
                "Search query must be at least {MIN_SEARCH_LEN} characters long"
            )));
        }
        let needle = query.to_lowercase();
        let contains = |doc: &Document, field: &str| {
            doc.str_field(field)
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        };

        let mut results = Vec::new();
        for project in self.gateway.get_all(&projects()).await? {
            for doc in self.gateway.get_all(&issues(&project.id)).await? {
                if contains(&doc, "title")
                    || contains(&doc, "description")
                    || doc.id.to_lowercase() == needle
                {
                    results.push(doc.decode()?);
                }
            }
        }
        Ok(results)
    }

    /// Owning project of an issue, or `NotFound`.
    pub async fn find_issue_project(&self, issue_id: &str) -> Result<String> {
        self.locator
            .find_issue_project(issue_id)
            .await?
            .ok_or_else(|| Error::issue_not_found(issue_id))
    }

    pub async fn get_issue(&self, issue_id: &str) -> Result<Issue> {
        let project_id = self.find_issue_project(issue_id).await?;
        match self.gateway.get(&issues(&project_id).doc(issue_id)).await? {
            Some(doc) => Ok(doc.decode()?),
            None => Err(Error::issue_not_found(issue_id)),
        }
    }
}
