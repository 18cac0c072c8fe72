use std::collections::BTreeMap;

use super::document::{Document, Fields, Patch};
use super::path::DocPath;
use super::store::{Precondition, StoreError, Write, WriteBatch};

/// One attempt of a transaction body.
///
/// Reads come from the snapshot taken when the attempt started; writes are
/// buffered and only reach the store when the whole attempt commits.
#[derive(Debug)]
pub struct Transaction {
    snapshot: BTreeMap<DocPath, Option<Document>>,
    writes: Vec<Write>,
}

impl Transaction {
    pub(crate) fn new(snapshot: BTreeMap<DocPath, Option<Document>>) -> Self {
        Self {
            snapshot,
            writes: Vec::new(),
        }
    }

    pub fn get(&self, path: &DocPath) -> Result<Option<&Document>, StoreError> {
        self.snapshot
            .get(path)
            .map(Option::as_ref)
            .ok_or_else(|| StoreError::UndeclaredRead(path.to_string()))
    }

    pub fn set(&mut self, path: DocPath, fields: Fields) {
        self.writes.push(Write::Set { path, fields });
    }

    pub fn update(&mut self, path: DocPath, patch: Patch) {
        self.writes.push(Write::Update { path, patch });
    }

    /// The buffered writes, guarded by the versions every read observed.
    pub(crate) fn into_batch(self) -> WriteBatch {
        let preconditions = self
            .snapshot
            .into_iter()
            .map(|(path, doc)| Precondition {
                path,
                version: doc.map(|doc| doc.version),
            })
            .collect();

        WriteBatch {
            preconditions,
            writes: self.writes,
        }
    }
}
