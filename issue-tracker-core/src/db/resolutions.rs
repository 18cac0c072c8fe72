use super::document::{encode, Document, Fields, Patch};
use super::path::{issues, DocPath, RESOLUTIONS};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{CreateResolutionInput, IssueStatus, Resolution};
use crate::timestamps::{add_timestamps, UPDATED_AT};

const RESOLVED_AT: &str = "resolved_at";

impl Database {
    /// Record a resolution for an issue and mark the issue `Resolved`.
    pub async fn add_resolution(&self, input: CreateResolutionInput) -> Result<Resolution> {
        let project_id = self.find_issue_project(&input.issue_id).await?;
        let issue = issues(&project_id).doc(&input.issue_id);

        let mut fields = add_timestamps(encode(&input)?, false);
        if let Some(stamp) = fields.get(UPDATED_AT).cloned() {
            fields.insert(RESOLVED_AT.to_string(), stamp);
        }

        let id = self.commit_resolution(&issue, fields.clone()).await?;
        Ok(Document::new(id, fields).decode()?)
    }

    /// Write `fields` as a new resolution under `issue` and flip the issue to
    /// `Resolved`, in one transaction.
    ///
    /// `fields` must already be timestamped; the issue's `updated_at` is set
    /// to the resolution's. The issue's current status is not checked: any
    /// issue, including an already resolved or closed one, ends up `Resolved`.
    pub async fn commit_resolution(&self, issue: &DocPath, fields: Fields) -> Result<String> {
        let updated_at = fields
            .get(UPDATED_AT)
            .cloned()
            .ok_or_else(|| Error::Validation("resolution has no updated_at".into()))?;
        let resolutions = issue.collection(RESOLUTIONS);

        let id = self
            .gateway
            .run_transaction(std::slice::from_ref(issue), |tx| {
                if tx.get(issue)?.is_none() {
                    return Err(Error::issue_not_found(issue.id()));
                }

                let resolution = resolutions.auto_doc();
                tx.set(resolution.clone(), fields.clone());
                tx.update(
                    issue.clone(),
                    Patch::new()
                        .set("status", IssueStatus::Resolved.as_str())
                        .set(UPDATED_AT, updated_at.clone()),
                );
                Ok(resolution.id().to_string())
            })
            .await?;

        tracing::info!(issue = %issue, resolution_id = %id, "resolution committed");
        Ok(id)
    }

    pub async fn list_resolutions(&self, issue_id: &str) -> Result<Vec<Resolution>> {
        let project_id = self.find_issue_project(issue_id).await?;
        let docs = self
            .gateway
            .get_all(&issues(&project_id).doc(issue_id).collection(RESOLUTIONS))
            .await?;
        docs.iter()
            .map(|doc| doc.decode().map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::projects;
    use serde_json::json;

    #[test]
    fn commit_requires_timestamped_fields() {
        tokio_test::block_on(async {
            let db = Database::open_memory();
            let issue = issues("p").doc("ISSUE-1");
            let err = db
                .commit_resolution(&issue, Fields::new())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        });
    }

    #[test]
    fn commit_against_missing_issue_writes_nothing() {
        tokio_test::block_on(async {
            let db = Database::open_memory();
            let issue = issues("p").doc("ISSUE-1");
            let fields = add_timestamps(
                json!({"resolver": "bob"}).as_object().cloned().unwrap(),
                false,
            );

            let err = db.commit_resolution(&issue, fields).await.unwrap_err();
            assert!(matches!(err, Error::NotFound(_)));

            let written = db
                .gateway()
                .get_all(&issue.collection(RESOLUTIONS))
                .await
                .unwrap();
            assert!(written.is_empty());
            assert!(db.gateway().get_all(&projects()).await.unwrap().is_empty());
        });
    }
}
