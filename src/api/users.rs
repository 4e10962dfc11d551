//! `/users` handlers.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::StoreError;
use crate::http::request::{QueryParams, Request};
use crate::http::response;
use crate::store::{Condition, Operator, Store, Where};

pub const TABLE: &str = "users";

/// Query keys `GET /users` turns into filters.
const FILTERABLE_FIELDS: [&str; 2] = ["name", "email"];

/// `GET /users[?name=..&email=..]`
pub async fn list(request: Request, store: Arc<Store>) -> Response {
    let filter = filter_from_query(request.query());

    match store.select(TABLE, filter.as_ref()).await {
        Ok(users) => response::json(StatusCode::OK, &users),
        Err(e) => store_failure(&request, e),
    }
}

/// `POST /users` with `{name, email}`.
pub async fn create(request: Request, store: Arc<Store>) -> Response {
    let Some(body) = request.body().and_then(Value::as_object) else {
        return response::error(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };

    let id = Uuid::new_v4().to_string();
    let mut user = Map::new();
    user.insert("id".into(), Value::String(id.clone()));
    for field in FILTERABLE_FIELDS {
        if let Some(value) = body.get(field) {
            user.insert(field.into(), value.clone());
        }
    }

    match store.insert(TABLE, user).await {
        Ok(()) => {
            tracing::debug!(id = %id, "User created");
            response::json(StatusCode::CREATED, &json!({ "id": id }))
        }
        Err(e) => store_failure(&request, e),
    }
}

/// `PUT /users/:id` with the fields to overwrite.
pub async fn update(request: Request, store: Arc<Store>) -> Response {
    let Some(patch) = request.body().and_then(Value::as_object) else {
        return response::error(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };

    match store.update(TABLE, patch, Some(&by_id(&request))).await {
        Ok(()) => response::empty(StatusCode::NO_CONTENT),
        Err(e) => store_failure(&request, e),
    }
}

/// `DELETE /users/:id`
pub async fn delete(request: Request, store: Arc<Store>) -> Response {
    match store.delete(TABLE, Some(&by_id(&request))).await {
        Ok(()) => response::empty(StatusCode::NO_CONTENT),
        Err(e) => store_failure(&request, e),
    }
}

/// One `IN`/`OR` clause per filterable key; a repeated key keeps its first
/// position and its last value.
fn filter_from_query(query: &QueryParams) -> Option<Where> {
    let mut filter = Where::new();
    for (key, value) in query.iter() {
        if FILTERABLE_FIELDS.contains(&key) {
            filter.insert(key, Condition::new(Operator::In, value).or());
        }
    }

    (!filter.is_empty()).then_some(filter)
}

fn by_id(request: &Request) -> Where {
    let id = request.param("id").unwrap_or_default();
    Where::new().field("id", Condition::equals(id))
}

fn store_failure(request: &Request, error: StoreError) -> Response {
    tracing::error!(
        request_id = request.request_id().unwrap_or("unknown"),
        uri = %request.uri(),
        error = %error,
        "Store operation failed"
    );
    response::error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}
