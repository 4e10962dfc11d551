//! HTTP API served on top of the store.
//!
//! ```text
//! GET    /users[?name=..&email=..]  → 200 [user, ...]
//! POST   /users        {name,email} → 201 {"id"}
//! PUT    /users/:id    {fields...}  → 204
//! DELETE /users/:id                 → 204
//! ```

pub mod users;

use std::sync::Arc;

use crate::error::RouteError;
use crate::routing::Router;
use crate::store::Store;

/// Register every API route against `store`.
pub fn routes(store: Arc<Store>) -> Result<Router<Arc<Store>>, RouteError> {
    Router::new(store)
        .get("/users", users::list)?
        .post("/users", users::create)?
        .put("/users/:id", users::update)?
        .delete("/users/:id", users::delete)
}
