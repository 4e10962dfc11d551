//! Body-parsing step run before every dispatch.
//!
//! The body is drained completely before routing looks at the request. A
//! body that is empty or not valid JSON becomes `None`; only a body that
//! cannot be read at all is an error.

use axum::body::Body;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Failed to read request body: {0}")]
    Read(#[from] axum::Error),
}

/// Drain `body` (at most `limit` bytes) and parse it as JSON.
pub async fn read_json_body(body: Body, limit: usize) -> Result<Option<Value>, BodyError> {
    let bytes = axum::body::to_bytes(body, limit).await?;
    Ok(parse_json(&bytes))
}

/// Parse a fully buffered body; malformed input is `None`.
pub fn parse_json(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }

    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, bytes = bytes.len(), "Malformed request body ignored");
            None
        }
    }
}
