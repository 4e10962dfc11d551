//! Request handed to route handlers.
//!
//! # Responsibilities
//! - Carry the parsed JSON body (or `None` when it was not valid JSON)
//! - Carry path parameters captured by the matched template
//! - Carry query parameters parsed from the request target
//! - Expose the request ID assigned by the request-id layer

use std::collections::HashMap;

use axum::http::{request::Parts, HeaderMap, Method, Uri};
use serde_json::Value;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// A routed request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Value>,
    params: HashMap<String, String>,
    query: QueryParams,
}

impl Request {
    /// Build from the head of an HTTP request and its already-parsed body.
    pub fn new(parts: Parts, body: Option<Value>) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            query: QueryParams::default(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path plus query string, the string route templates are matched against.
    pub fn target(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// Parsed JSON body; `None` if the body was empty or not valid JSON.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }

    /// Path parameters of the matched template.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub(crate) fn set_query(&mut self, query: QueryParams) {
        self.query = query;
    }
}

/// Ordered, possibly repeated query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string (without `?`).
    pub fn parse(query: &str) -> Self {
        Self(url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
    }

    /// Parse the query part of a request target, if any.
    pub fn from_target(target: &str) -> Self {
        match target.split_once('?') {
            Some((_, query)) => Self::parse(query),
            None => Self::default(),
        }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
