//! JSON-file table store served over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::router ──▶ api::users ──▶ store
//!                     (request id,     (body step,         (handlers)     (select / insert /
//!                      trace, limits)   template match)                     update / delete)
//!                                                                              │
//!                                                                              ▼
//!                                                                        store::persist
//!                                                                        (storage.json)
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::AppConfig;
pub use error::{RouteError, StoreError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::Store;
