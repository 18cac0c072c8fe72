//! Core library for the issue tracker.
//!
//! This crate provides the domain models, the document store access layer
//! and its consistency rules (parent existence checks, timestamps, issue to
//! project lookup, the transactional resolution commit), independent of any
//! transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use issue_tracker_core::db::{Database, SqliteStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = SqliteStore::open_default()?;
//! store.migrate()?;
//! let db = Database::new(Arc::new(store));
//!
//! let projects = db.list_projects().await?;
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod error;
pub mod ids;
pub mod models;
pub mod timestamps;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{Error, Result};
