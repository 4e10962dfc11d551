//! Response helpers for route handlers.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Serialize `value` as the JSON body of a `status` response.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            error(StatusCode::INTERNAL_SERVER_ERROR, "response serialization failed")
        }
    }
}

/// Status only, no body.
pub fn empty(status: StatusCode) -> Response {
    status.into_response()
}

/// `{"error": message}` with the given status.
pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({ "error": message.into() });
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))],
        body.to_string(),
    )
        .into_response()
}

/// `NOT FOUND` for an unmatched method and path. The content type is left to
/// the router, which declares every response as JSON.
pub fn not_found() -> Response {
    let mut response = Response::new(Body::from("NOT FOUND"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Declare the body as JSON unless the handler already chose a content type.
pub(crate) fn ensure_json_content_type(response: &mut Response) {
    response
        .headers_mut()
        .entry(header::CONTENT_TYPE)
        .or_insert(HeaderValue::from_static(APPLICATION_JSON));
}
