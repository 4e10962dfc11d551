//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout, body limit)
//!     → body.rs (drain and parse the JSON body)
//!     → [routing layer picks the handler]
//!     → request.rs (params, query, body handed to the handler)
//!     → response.rs (JSON / plain-text responses)
//!     → Send to client
//! ```

pub mod body;
pub mod request;
pub mod response;
pub mod server;

pub use request::{QueryParams, Request, X_REQUEST_ID};
pub use server::HttpServer;
