//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path?query, body)
//!     → router.rs (body step, then method + template scan)
//!     → matcher.rs (anchored template pattern, named segments)
//!     → Handler(Request { params, query, body }, state) or 404
//!
//! Route Registration (at startup):
//!     route(method, template, handler)
//!     → Compile template into a PathMatcher
//!     → Append to the method's list
//!     → Share the finished Router behind an Arc
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod router;

pub use matcher::PathMatcher;
pub use router::{Handler, Router};
