//! Whole-file persistence of the table set.
//!
//! The file is a single JSON object, one key per table, each value an array
//! of record objects. Every write replaces the entire file; there is no
//! append format, fsync, or atomic rename.

use std::path::{Path, PathBuf};
use std::time::Instant;

use indexmap::IndexMap;
use thiserror::Error;

use crate::error::{StoreError, StoreResult};
use crate::observability::metrics;
use crate::store::Record;

/// Every table by name, in the order the tables were first created.
pub type Tables = IndexMap<String, Vec<Record>>;

/// Why the storage file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read storage file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed storage file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Handle on the JSON file backing a store.
#[derive(Debug, Clone)]
pub struct StorageFile {
    path: PathBuf,
}

impl StorageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the file.
    pub async fn load(&self) -> Result<Tables, LoadError> {
        let content = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Overwrite the file with already-encoded content.
    pub async fn write(&self, content: &[u8]) -> StoreResult<()> {
        let start = Instant::now();

        let result = tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| StoreError::Persistence {
                path: self.path.clone(),
                source,
            });

        metrics::record_persist(result.is_ok(), start);

        match &result {
            Ok(()) => tracing::trace!(path = ?self.path, bytes = content.len(), "Storage persisted"),
            Err(e) => tracing::error!(error = %e, "Database persist storage error"),
        }

        result
    }
}

/// Encode the table set in the on-disk format.
pub fn encode(tables: &Tables) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(tables)?)
}
