use async_trait::async_trait;

use super::gateway::Gateway;
use super::path::{is_valid_id, issues, projects};
use super::store::StoreError;

/// Finds the project that owns an issue.
///
/// Issues live under their project, so looking one up by id alone needs
/// this extra step. Callers only see this trait; an index-backed
/// implementation can replace [`ScanLocator`] without touching them.
#[async_trait]
pub trait IssueLocator: Send + Sync {
    async fn find_issue_project(&self, issue_id: &str) -> Result<Option<String>, StoreError>;
}

/// Probes every project in enumeration order; the first match wins.
pub struct ScanLocator {
    gateway: Gateway,
}

impl ScanLocator {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl IssueLocator for ScanLocator {
    async fn find_issue_project(&self, issue_id: &str) -> Result<Option<String>, StoreError> {
        if !is_valid_id(issue_id) {
            return Ok(None);
        }

        let candidates = self.gateway.get_all(&projects()).await?;
        tracing::debug!(issue_id, projects = candidates.len(), "scanning projects for issue");

        for project in candidates {
            if self.gateway.exists(&issues(&project.id), issue_id).await? {
                return Ok(Some(project.id));
            }
        }
        Ok(None)
    }
}
