use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced parent or target document does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("No update data provided")]
    NothingToUpdate,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn project_not_found(project_id: &str) -> Self {
        Self::NotFound(format!("Project with ID '{project_id}' not found."))
    }

    pub(crate) fn issue_not_found(issue_id: &str) -> Self {
        Self::NotFound(format!(
            "Issue with ID '{issue_id}' not found in any project."
        ))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
