//! Document store access.
//!
//! [`DocumentStore`] is the backend capability (SQLite or in-memory),
//! [`Gateway`] the shared handle over it, and [`Database`] the entity
//! operations built on top: parent-existence checks, timestamping, issue
//! lookup and the transactional resolution commit.

mod document;
mod gateway;
mod issues;
mod memory;
mod path;
mod projects;
mod resolutions;
mod resolver;
mod schema;
mod sqlite;
mod store;
mod transaction;

use std::sync::Arc;

pub use document::{encode, Document, FieldChange, Fields, Filter, Patch};
pub use gateway::{Gateway, MAX_TRANSACTION_ATTEMPTS};
pub use memory::MemoryStore;
pub use path::{
    auto_id, is_valid_id, issues, projects, resolutions, CollectionPath, DocPath, ISSUES, PROJECTS,
    RESOLUTIONS,
};
pub use resolver::{IssueLocator, ScanLocator};
pub use sqlite::SqliteStore;
pub use store::{DocumentStore, Precondition, StoreError, Write, WriteBatch};
pub use transaction::Transaction;

/// Entity operations over an injected document store.
///
/// Cheap to clone; every clone shares the same store and locator.
#[derive(Clone)]
pub struct Database {
    gateway: Gateway,
    locator: Arc<dyn IssueLocator>,
}

impl Database {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let gateway = Gateway::new(store);
        let locator = Arc::new(ScanLocator::new(gateway.clone()));
        Self { gateway, locator }
    }

    pub fn open_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Replace the issue-to-project lookup strategy.
    pub fn with_locator(mut self, locator: Arc<dyn IssueLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}
