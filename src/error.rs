//! Error definitions shared by the store and the routing layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing (or initially re-creating) the storage file failed.
    #[error("Failed to persist storage to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table set could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `IN` / `NOT_IN` was evaluated against a field that is neither an array nor a string.
    #[error("Field '{field}' is not iterable, membership test is undefined")]
    NonIterableMembershipTest { field: String },

    /// The WHERE specification named an operator that does not exist.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// The WHERE specification had the wrong shape.
    #[error("Invalid WHERE specification: {0}")]
    InvalidWhere(String),
}

/// Errors raised while registering routes.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path template could not be compiled into a pattern.
    #[error("Invalid path template '{template}': {source}")]
    InvalidTemplate {
        template: String,
        #[source]
        source: regex::Error,
    },

    /// The HTTP method name is not a valid token.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
