//! # Router Module
//!
//! Path matching and route resolution.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route patterns (`/users/:id`, `/users/{id}`) into segments
//! - Matching a method and concrete path to a registered handler
//! - Extracting path parameters from matched routes
//! - Reporting which methods a path supports (for `Allow` headers)
//!
//! ## Matching rules
//!
//! Exact routes (no parameter segments) live in a per-method hash table and are
//! always checked first. Parameterized routes are scanned in registration
//! order and the first full match wins. A parameter never binds to an empty
//! segment, so `/user/:id` matches neither `/user` nor `/user/`.
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::handler::handler_fn;
//! use brrtdispatch::router::{BuiltinRouter, Router};
//! use http::{Method, StatusCode};
//!
//! let mut router = BuiltinRouter::new();
//! router
//!     .register(Method::GET, "/pets/:id", handler_fn(|w, _req| w.write_header(StatusCode::OK)))
//!     .unwrap();
//!
//! let m = router.match_route(&Method::GET, "/pets/42").unwrap();
//! assert_eq!(m.params.get("id"), Some("42"));
//! assert!(router.match_route(&Method::GET, "/pets/").is_none());
//! ```

mod core;
mod error;
mod methods;
mod pattern;
#[cfg(test)]
mod tests;

pub use core::{BuiltinRouter, MethodsFor, ParamVec, Params, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use error::RouteError;
pub use methods::{allow_header, stable_allow};
pub use pattern::{param_name, split_path, CompiledPattern, Segment};
