//! Document store.
//!
//! # Data Flow
//! ```text
//! handler
//!     → Store::{select, insert, update, delete}
//!     → query.rs (WHERE fold per record)
//!     → in-memory table set (RwLock)
//!     → persist.rs (whole-file JSON write-back, mutations only)
//! ```
//!
//! # Design Decisions
//! - Tables are created lazily, empty, on first access by any operation
//! - Records are schema-free ordered JSON objects; select returns owned copies
//! - One store-wide RwLock: selects share it, mutations hold it exclusively
//! - The persist lock is taken before the table lock is released, so
//!   write-backs happen in mutation order and never interleave
//! - Not durable: no WAL, no fsync, no atomic rename, no indexes

pub mod persist;
pub mod query;
pub(crate) mod value;

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};

use crate::config::schema::{InsertPersistence, StorageConfig};
use crate::error::StoreResult;

use self::persist::{StorageFile, Tables};
pub use self::query::{Condition, Conjunction, Operator, Where};

/// A schema-free record: field name to JSON value, in field order.
pub type Record = Map<String, Value>;

/// In-memory table set backed by a single JSON file.
#[derive(Debug)]
pub struct Store {
    tables: RwLock<Tables>,
    file: StorageFile,
    persist_lock: Arc<Mutex<()>>,
    insert_persistence: InsertPersistence,
}

impl Store {
    /// Load the store from the configured file.
    ///
    /// A missing or malformed file is not fatal: the store starts empty and
    /// the file is immediately rewritten as an empty table set. Only the
    /// failure of that rewrite is returned.
    pub async fn open(config: &StorageConfig) -> StoreResult<Self> {
        let file = StorageFile::new(&config.path);

        let (tables, rewrite) = match file.load().await {
            Ok(tables) => {
                tracing::info!(
                    path = ?file.path(),
                    tables = tables.len(),
                    "Storage loaded"
                );
                (tables, false)
            }
            Err(e) => {
                tracing::warn!(
                    path = ?file.path(),
                    error = %e,
                    "Storage unavailable, starting empty"
                );
                (Tables::new(), true)
            }
        };

        let store = Self {
            tables: RwLock::new(tables),
            file,
            persist_lock: Arc::new(Mutex::new(())),
            insert_persistence: config.insert_persistence,
        };

        if rewrite {
            store.flush().await?;
        }

        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Records of `table` in insertion order, filtered by `filter` when given.
    pub async fn select(&self, table: &str, filter: Option<&Where>) -> StoreResult<Vec<Record>> {
        {
            let tables = self.tables.read().await;
            if let Some(rows) = tables.get(table) {
                return filter_rows(rows, filter);
            }
        }

        // Unknown table: create it. A concurrent insert may have won the race.
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        filter_rows(rows, filter)
    }

    /// Append `record` to `table` verbatim.
    pub async fn insert(&self, table: &str, record: Record) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(record);

        tracing::debug!(table, "Record inserted");

        match self.insert_persistence {
            InsertPersistence::Awaited => self.commit(tables).await,
            InsertPersistence::Detached => self.commit_detached(tables).await,
        }
    }

    /// Merge `patch` into every record selected by `filter` (every record when
    /// `filter` is `None`). Only patch fields the record already has are applied;
    /// this is decided separately for each record.
    pub async fn update(&self, table: &str, patch: &Record, filter: Option<&Where>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        let mut updated = Vec::with_capacity(rows.len());
        let mut changed = 0usize;
        for row in rows.iter() {
            let selected = match filter {
                None => true,
                Some(filter) => filter.matches(row)?,
            };

            if selected {
                let mut row = row.clone();
                for (field, value) in patch {
                    if let Some(slot) = row.get_mut(field) {
                        *slot = value.clone();
                    }
                }
                changed += 1;
                updated.push(row);
            } else {
                updated.push(row.clone());
            }
        }
        *rows = updated;

        tracing::debug!(table, records = changed, "Records updated");

        self.commit(tables).await
    }

    /// Remove every record selected by `filter`. `None` truncates the table.
    pub async fn delete(&self, table: &str, filter: Option<&Where>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        let before = rows.len();
        let kept = match filter {
            None => Vec::new(),
            Some(filter) => {
                let mut kept = Vec::with_capacity(rows.len());
                for row in rows.iter() {
                    if !filter.matches(row)? {
                        kept.push(row.clone());
                    }
                }
                kept
            }
        };
        let removed = before - kept.len();
        *rows = kept;

        tracing::debug!(table, records = removed, "Records deleted");

        self.commit(tables).await
    }

    /// Persist the current table set and wait for any pending write-back.
    pub async fn flush(&self) -> StoreResult<()> {
        let tables = self.tables.write().await;
        self.commit(tables).await
    }

    /// Encode under the table lock, then write once this mutation's turn comes.
    async fn commit(&self, tables: RwLockWriteGuard<'_, Tables>) -> StoreResult<()> {
        let content = persist::encode(&tables)?;
        let _turn = self.persist_lock.lock().await;
        drop(tables);

        self.file.write(&content).await
    }

    /// Like [`Store::commit`], but the write runs on a background task and its
    /// failure is only logged.
    async fn commit_detached(&self, tables: RwLockWriteGuard<'_, Tables>) -> StoreResult<()> {
        let content = persist::encode(&tables)?;
        let turn = Arc::clone(&self.persist_lock).lock_owned().await;
        drop(tables);

        let file = self.file.clone();
        tokio::spawn(async move {
            let _turn = turn;
            // StorageFile::write already logs the failure.
            let _ = file.write(&content).await;
        });

        Ok(())
    }
}

fn filter_rows(rows: &[Record], filter: Option<&Where>) -> StoreResult<Vec<Record>> {
    let Some(filter) = filter else {
        return Ok(rows.to_vec());
    };

    let mut selected = Vec::new();
    for row in rows {
        if filter.matches(row)? {
            selected.push(row.clone());
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn config(dir: &TempDir) -> StorageConfig {
        StorageConfig {
            path: dir.path().join("storage.json"),
            insert_persistence: InsertPersistence::Awaited,
        }
    }

    async fn seeded(dir: &TempDir) -> Store {
        let store = Store::open(&config(dir)).await.unwrap();
        store.insert("users", record(json!({ "id": "1", "name": "ana", "age": 20 }))).await.unwrap();
        store.insert("users", record(json!({ "id": "2", "name": "bob" }))).await.unwrap();
        store.insert("users", record(json!({ "id": "3", "name": "cy", "age": 40 }))).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_open_rewrites_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&config(&dir)).await.unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "{}");
    }

    #[tokio::test]
    async fn test_open_recovers_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir);
        std::fs::write(&cfg.path, "{ broken").unwrap();

        let store = Store::open(&cfg).await.unwrap();
        assert!(store.select("users", None).await.unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(&cfg.path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_open_fails_when_rewrite_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StorageConfig {
            path: dir.path().join("missing-dir").join("storage.json"),
            insert_persistence: InsertPersistence::Awaited,
        };

        assert!(matches!(
            Store::open(&cfg).await,
            Err(StoreError::Persistence { .. })
        ));
    }

    #[tokio::test]
    async fn test_select_unknown_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&config(&dir)).await.unwrap();

        assert!(store.select("never_written", None).await.unwrap().is_empty());
        let filter = Where::new().field("id", Condition::equals("1"));
        assert!(store.select("other", Some(&filter)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_appends_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let extra = record(json!({ "id": "custom", "tags": ["x"], "nested": { "a": 1 } }));
        store.insert("users", extra.clone()).await.unwrap();

        let rows = store.select("users", None).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows.last(), Some(&extra));
        assert_eq!(rows[0]["id"], json!("1"));
    }

    #[tokio::test]
    async fn test_select_with_filter() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let filter = Where::new().field("age", Condition::new(Operator::Gte, 30));
        let rows = store.select("users", Some(&filter)).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!("3"));
    }

    #[tokio::test]
    async fn test_select_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&config(&dir)).await.unwrap();

        store.select("lazy", None).await.unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_delete_without_filter_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        store.delete("users", None).await.unwrap();
        assert!(store.select("users", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_matching_nothing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let filter = Where::new().field("id", Condition::equals("404"));
        store.delete("users", Some(&filter)).await.unwrap();
        assert_eq!(store.select("users", None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_with_filter() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let filter = Where::new().field("id", Condition::equals(2));
        store.delete("users", Some(&filter)).await.unwrap();

        let ids: Vec<_> = store
            .select("users", None)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("1"), json!("3")]);
    }

    #[tokio::test]
    async fn test_update_only_touches_existing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let patch = record(json!({ "age": 99, "email": "x@y.z" }));
        let filter = Where::new().field("id", Condition::equals("2"));
        store.update("users", &patch, Some(&filter)).await.unwrap();

        let rows = store.select("users", None).await.unwrap();
        // Record 2 has no "age" and no "email": the patch is dropped entirely.
        assert_eq!(rows[1], record(json!({ "id": "2", "name": "bob" })));
        // Record 1 was not selected.
        assert_eq!(rows[0]["age"], json!(20));
    }

    #[tokio::test]
    async fn test_update_filters_patch_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let patch = record(json!({ "age": 1, "name": "renamed" }));
        store.update("users", &patch, None).await.unwrap();

        let rows = store.select("users", None).await.unwrap();
        assert_eq!(rows[0], record(json!({ "id": "1", "name": "renamed", "age": 1 })));
        assert_eq!(rows[1], record(json!({ "id": "2", "name": "renamed" })));
        assert_eq!(rows[2], record(json!({ "id": "3", "name": "renamed", "age": 1 })));
    }

    #[tokio::test]
    async fn test_failed_predicate_leaves_table_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let filter = Where::new().field("age", Condition::new(Operator::In, 20));
        let result = store.delete("users", Some(&filter)).await;

        assert!(matches!(result, Err(StoreError::NonIterableMembershipTest { .. })));
        assert_eq!(store.select("users", None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;
        store.insert("posts", record(json!({ "title": "hi", "tags": ["a"] }))).await.unwrap();

        let users = store.select("users", None).await.unwrap();
        let posts = store.select("posts", None).await.unwrap();
        drop(store);

        let reopened = Store::open(&config(&dir)).await.unwrap();
        assert_eq!(reopened.select("users", None).await.unwrap(), users);
        assert_eq!(reopened.select("posts", None).await.unwrap(), posts);
    }

    #[tokio::test]
    async fn test_detached_insert_persists() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StorageConfig {
            insert_persistence: InsertPersistence::Detached,
            ..config(&dir)
        };
        let store = Store::open(&cfg).await.unwrap();

        store.insert("users", record(json!({ "id": "1" }))).await.unwrap();
        store.flush().await.unwrap();

        let on_disk: Value = serde_json::from_slice(&std::fs::read(&cfg.path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({ "users": [{ "id": "1" }] }));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_all_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(&config(&dir)).await.unwrap());

        let mut tasks = Vec::new();
        for i in 0..25 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.insert("users", record(json!({ "n": i }))).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let reopened = Store::open(&config(&dir)).await.unwrap();
        assert_eq!(reopened.select("users", None).await.unwrap().len(), 25);
    }
}
