//! In-process document store.
//!
//! Holds every document in one ordered map behind a mutex. The lock is
//! never held across an await point, so each operation (including a whole
//! batch commit) is atomic with respect to every other.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::document::{Document, Fields};
use super::path::{CollectionPath, DocPath};
use super::store::{DocumentStore, StoreError, Write, WriteBatch};

#[derive(Debug, Clone)]
struct Stored {
    fields: Fields,
    version: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<BTreeMap<DocPath, Stored>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<DocPath, Stored>>, StoreError> {
        self.docs
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

fn to_document(path: &DocPath, stored: &Stored) -> Document {
    Document {
        id: path.id().to_string(),
        fields: stored.fields.clone(),
        version: stored.version,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        path.validate()?;
        let docs = self.lock()?;
        Ok(docs.get(path).map(|stored| to_document(path, stored)))
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let docs = self.lock()?;
        Ok(docs
            .iter()
            .filter(|(path, _)| path.parent() == collection)
            .map(|(path, stored)| to_document(path, stored))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut docs = self.lock()?;

        for pre in &batch.preconditions {
            let current = docs.get(&pre.path).map(|stored| stored.version);
            if current != pre.version {
                return Err(StoreError::Conflict(pre.path.to_string()));
            }
        }

        // Stage every write first so a failing update leaves nothing applied.
        let mut staged: BTreeMap<DocPath, Stored> = BTreeMap::new();
        for write in &batch.writes {
            let path = write.path();
            path.validate()?;
            let current = staged.get(path).or_else(|| docs.get(path)).cloned();
            let version = current.as_ref().map_or(1, |stored| stored.version + 1);
            let fields = match write {
                Write::Set { fields, .. } => fields.clone(),
                Write::Update { patch, .. } => {
                    let mut fields = current
                        .ok_or_else(|| StoreError::NotFound(path.to_string()))?
                        .fields;
                    patch.apply(&mut fields);
                    fields
                }
            };
            staged.insert(path.clone(), Stored { fields, version });
        }

        docs.extend(staged);
        Ok(())
    }
}
