use async_trait::async_trait;

use super::document::{Document, Fields, Filter, Patch};
use super::path::{CollectionPath, DocPath};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid document path: {0}")]
    InvalidPath(String),

    #[error("no document to update at {0}")]
    NotFound(String),

    #[error("transaction conflict on {0}")]
    Conflict(String),

    #[error("transaction read {0} without declaring it")]
    UndeclaredRead(String),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or replace the whole document.
    Set { path: DocPath, fields: Fields },
    /// Merge into an existing document; fails when it is missing.
    Update { path: DocPath, patch: Patch },
}

impl Write {
    pub fn path(&self) -> &DocPath {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } => path,
        }
    }
}

/// The document must still be at `version` (`None`: must not exist) for the batch to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub path: DocPath,
    pub version: Option<u64>,
}

/// Writes applied all-or-nothing, guarded by preconditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub preconditions: Vec<Precondition>,
    pub writes: Vec<Write>,
}

impl WriteBatch {
    pub fn single(write: Write) -> Self {
        Self {
            preconditions: Vec::new(),
            writes: vec![write],
        }
    }
}

/// Backing document store.
///
/// Backends implement reads and atomic batch commits; single-document
/// writes are batches of one. A failed precondition must surface as
/// [`StoreError::Conflict`] without applying any write of the batch.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// Unordered enumeration of a collection.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError>;

    async fn query(
        &self,
        collection: &CollectionPath,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.list(collection).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| filters.iter().all(|f| f.matches(&doc.fields)))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        self.commit(WriteBatch::single(Write::Set {
            path: path.clone(),
            fields,
        }))
        .await
    }

    async fn update(&self, path: &DocPath, patch: Patch) -> Result<(), StoreError> {
        self.commit(WriteBatch::single(Write::Update {
            path: path.clone(),
            patch,
        }))
        .await
    }
}
