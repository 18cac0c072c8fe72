use std::collections::BTreeMap;
use std::sync::Arc;

use super::document::{Document, Fields, Filter, Patch};
use super::path::{is_valid_id, CollectionPath, DocPath};
use super::store::{DocumentStore, StoreError};
use super::transaction::Transaction;

/// Attempts made before a contended transaction gives up.
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// Handle on the document store shared by every component.
///
/// Cheap to clone; all clones talk to the same backend.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn DocumentStore>,
}

impl Gateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Whether `collection/id` holds a document. Empty or malformed ids never do.
    pub async fn exists(&self, collection: &CollectionPath, id: &str) -> Result<bool, StoreError> {
        if !is_valid_id(id) {
            return Ok(false);
        }
        Ok(self.store.get(&collection.doc(id)).await?.is_some())
    }

    pub async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        self.store.get(path).await
    }

    pub async fn get_all(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        self.store.list(collection).await
    }

    pub async fn query(
        &self,
        collection: &CollectionPath,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        self.store.query(collection, filters).await
    }

    pub async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        tracing::debug!(path = %path, "set document");
        self.store.set(path, fields).await
    }

    pub async fn update(&self, path: &DocPath, patch: Patch) -> Result<(), StoreError> {
        tracing::debug!(path = %path, "update document");
        self.store.update(path, patch).await
    }

    /// Run `body` as one atomic transaction.
    ///
    /// Every document in `reads` is snapshotted before each attempt. If any of
    /// them changes before the buffered writes commit, the body runs again
    /// against a fresh snapshot, up to [`MAX_TRANSACTION_ATTEMPTS`] times.
    pub async fn run_transaction<T, E, F>(&self, reads: &[DocPath], mut body: F) -> Result<T, E>
    where
        F: FnMut(&mut Transaction) -> Result<T, E> + Send,
        T: Send,
        E: From<StoreError> + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut snapshot = BTreeMap::new();
            for path in reads {
                snapshot.insert(path.clone(), self.store.get(path).await?);
            }

            let mut tx = Transaction::new(snapshot);
            let value = body(&mut tx)?;

            match self.store.commit(tx.into_batch()).await {
                Ok(()) => {
                    tracing::debug!(attempt, "transaction committed");
                    return Ok(value);
                }
                Err(StoreError::Conflict(path)) if attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::warn!(attempt, path = %path, "transaction conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
