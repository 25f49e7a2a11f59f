//! # Middleware Module
//!
//! A [`Middleware`] wraps a handler and returns a new one. [`Middlewares`]
//! composes a list outer-to-inner, and [`Stack`] is an editable list whose
//! entries are addressed by id.
//!
//! Bundled layers:
//! - [`RequestIdMiddleware`] - `X-Request-ID` propagation
//! - [`TracingMiddleware`] - per-request span with status and latency

mod core;
mod request_id;
mod stack;
mod tracing;

pub use core::{Middleware, Middlewares};
pub use request_id::{request_id, RequestIdMiddleware, REQUEST_ID_HEADER};
pub use stack::{Stack, Wrapper};
pub use tracing::TracingMiddleware;
