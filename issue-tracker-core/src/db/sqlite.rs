//! SQLite-backed document store.
//!
//! Every document is one row of the `documents` table, keyed by its full
//! path, with its fields kept as JSON. Equality queries are pushed into SQL
//! through `json_extract`; batch commits run inside an immediate transaction
//! so preconditions and writes see one consistent state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;

use super::document::{Document, Fields, Filter};
use super::path::{CollectionPath, DocPath};
use super::schema::SCHEMA;
use super::store::{DocumentStore, StoreError, Write, WriteBatch};

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_memory() -> Result<Self, StoreError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> anyhow::Result<Self> {
        let path = Self::default_path()?;
        Ok(Self::open(&path)?)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "issue-tracker")
            .ok_or_else(|| anyhow::anyhow!("could not determine a data directory"))?;
        let dir = dirs.data_dir();
        std::fs::create_dir_all(dir)?;
        Ok(dir.join("tracker.db"))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|err| StoreError::Backend(format!("database task failed: {err}")))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Backend("database lock poisoned".into()))
}

fn parse_fields(raw: &str) -> Result<Fields, StoreError> {
    Ok(serde_json::from_str(raw)?)
}

fn load(conn: &Connection, path: &DocPath) -> Result<Option<Document>, StoreError> {
    let row = conn
        .query_row(
            "SELECT fields, version FROM documents WHERE path = ?1",
            params![path.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    row.map(|(raw, version)| {
        Ok(Document {
            id: path.id().to_string(),
            fields: parse_fields(&raw)?,
            version: version as u64,
        })
    })
    .transpose()
}

fn upsert(conn: &Connection, path: &DocPath, fields: &Fields, now: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO documents (path, collection, doc_id, fields, version, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
         ON CONFLICT(path) DO UPDATE SET
             fields = excluded.fields,
             version = documents.version + 1,
             updated_at = excluded.updated_at",
        params![
            path.to_string(),
            path.parent().as_str(),
            path.id(),
            serde_json::to_string(fields)?,
            now,
        ],
    )?;
    Ok(())
}

/// SQL value comparable with the result of `json_extract`; `None` for JSON null.
fn sql_value(value: &Value) -> Option<SqlValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        }),
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        other => Some(SqlValue::Text(other.to_string())),
    }
}

fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', ""))
}

fn select_documents(
    conn: &Connection,
    collection: &CollectionPath,
    filters: &[Filter],
) -> Result<Vec<Document>, StoreError> {
    let mut sql = String::from("SELECT doc_id, fields, version FROM documents WHERE collection = ?1");
    let mut values = vec![SqlValue::Text(collection.as_str().to_string())];

    for filter in filters {
        values.push(SqlValue::Text(json_path(&filter.field)));
        let path_idx = values.len();
        match sql_value(&filter.value) {
            Some(value) => {
                values.push(value);
                sql.push_str(&format!(
                    " AND json_extract(fields, ?{path_idx}) = ?{}",
                    values.len()
                ));
            }
            None => sql.push_str(&format!(" AND json_type(fields, ?{path_idx}) = 'null'")),
        }
    }
    sql.push_str(" ORDER BY doc_id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, raw, version)| {
            Ok(Document {
                id,
                fields: parse_fields(&raw)?,
                version: version as u64,
            })
        })
        .collect()
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        path.validate()?;
        let path = path.clone();
        self.with_connection(move |conn| load(conn, &path)).await
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let collection = collection.clone();
        self.with_connection(move |conn| select_documents(conn, &collection, &[]))
            .await
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let collection = collection.clone();
        let filters = filters.to_vec();
        self.with_connection(move |conn| select_documents(conn, &collection, &filters))
            .await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.with_connection(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            for pre in &batch.preconditions {
                let current = load(&tx, &pre.path)?.map(|doc| doc.version);
                if current != pre.version {
                    return Err(StoreError::Conflict(pre.path.to_string()));
                }
            }

            let now = Utc::now().to_rfc3339();
            for write in &batch.writes {
                write.path().validate()?;
                match write {
                    Write::Set { path, fields } => upsert(&tx, path, fields, &now)?,
                    Write::Update { path, patch } => {
                        let mut doc =
                            load(&tx, path)?.ok_or_else(|| StoreError::NotFound(path.to_string()))?;
                        patch.apply(&mut doc.fields);
                        upsert(&tx, path, &doc.fields, &now)?;
                    }
                }
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::document::Patch;
    use crate::db::path::projects;
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn store() -> SqliteStore {
        let store = SqliteStore::open_memory().unwrap();
        store.migrate().unwrap();
        store
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn held_connection_does_not_stall_the_runtime() {
        let store = store();
        let conn = Arc::clone(&store.conn);
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let holder = std::thread::spawn(move || {
            let _guard = conn.lock().unwrap();
            locked_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(300));
        });
        locked_rx.recv().unwrap();

        tokio_test::block_on(async {
            let reader = store.clone();
            let started = Instant::now();
            let read = tokio::spawn(async move { reader.get(&projects().doc("p1")).await });
            tokio::task::yield_now().await;

            assert!(started.elapsed() < Duration::from_millis(150));
            assert!(read.await.unwrap().unwrap().is_none());
        });
        holder.join().unwrap();
    }

    #[test]
    fn migrate_is_idempotent() {
        let store = store();
        store.migrate().unwrap();
    }

    #[test]
    fn set_then_get_bumps_version() {
        tokio_test::block_on(async {
            let store = store();
            let path = projects().doc("p1");
            store.set(&path, fields(json!({"name": "a"}))).await.unwrap();
            store.set(&path, fields(json!({"name": "b"}))).await.unwrap();

            let doc = store.get(&path).await.unwrap().unwrap();
            assert_eq!(doc.fields["name"], json!("b"));
            assert_eq!(doc.version, 2);
        });
    }

    #[test]
    fn query_filters_inside_sql() {
        tokio_test::block_on(async {
            let store = store();
            let issues = projects().doc("p1").collection("issues");
            store
                .set(&issues.doc("i1"), fields(json!({"status": "Open", "frequency": 3})))
                .await
                .unwrap();
            store
                .set(&issues.doc("i2"), fields(json!({"status": "Resolved", "frequency": 3})))
                .await
                .unwrap();

            let open = store
                .query(&issues, &[Filter::eq("status", "Open")])
                .await
                .unwrap();
            assert_eq!(open.len(), 1);
            assert_eq!(open[0].id, "i1");

            let frequent = store
                .query(&issues, &[Filter::eq("frequency", 3)])
                .await
                .unwrap();
            assert_eq!(frequent.len(), 2);
        });
    }

    #[test]
    fn failed_update_rolls_back_whole_batch() {
        tokio_test::block_on(async {
            let store = store();
            let batch = WriteBatch {
                preconditions: Vec::new(),
                writes: vec![
                    Write::Set {
                        path: projects().doc("p1"),
                        fields: fields(json!({"name": "a"})),
                    },
                    Write::Update {
                        path: projects().doc("missing"),
                        patch: Patch::new().set("name", "x"),
                    },
                ],
            };

            let err = store.commit(batch).await.unwrap_err();
            assert!(matches!(err, StoreError::NotFound(_)));
            assert!(store.get(&projects().doc("p1")).await.unwrap().is_none());
        });
    }

    #[test]
    fn stale_precondition_is_a_conflict() {
        tokio_test::block_on(async {
            let store = store();
            let path = projects().doc("p1");
            store.set(&path, fields(json!({"name": "a"}))).await.unwrap();

            let batch = WriteBatch {
                preconditions: vec![crate::db::Precondition {
                    path: path.clone(),
                    version: None,
                }],
                writes: vec![Write::Set {
                    path: path.clone(),
                    fields: fields(json!({"name": "b"})),
                }],
            };

            let err = store.commit(batch).await.unwrap_err();
            assert!(matches!(err, StoreError::Conflict(_)));
            let doc = store.get(&path).await.unwrap().unwrap();
            assert_eq!(doc.fields["name"], json!("a"));
        });
    }
}
