//! # Dispatcher Module
//!
//! The single HTTP entry point. [`Dispatcher::serve`] runs each request
//! through a fixed pipeline:
//!
//! 1. Wrap the response sink in a [`crate::response::TrackingWriter`], so at
//!    most one status is ever sent.
//! 2. Body guard. A declared `Content-Length` above the limit is answered
//!    with `413` before any handler runs. Otherwise the body is swapped for a
//!    limiting reader that fails with [`BodyTooLarge`] past the limit.
//! 3. Router match on the real method and path; a hit runs the handler.
//! 4. OPTIONS without an explicit route: `204` with a synthesized `Allow`.
//! 5. HEAD without an explicit route: the GET handler runs with body writes
//!    discarded.
//! 6. Otherwise `405` with `Allow` if other methods exist for the path, or
//!    the not-found handler.
//!
//! Every resolved handler runs inside the recoverer ([`PanicRecovery`] by
//! default), after the decoded query map and path parameters have been
//! attached to the request. Handlers read them with [`query_map`] and
//! [`route_params`].
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::dispatcher::{route_params, Dispatcher};
//! use brrtdispatch::endpoint::Endpoint;
//! use brrtdispatch::handler::{handler_fn, Body};
//! use brrtdispatch::response::BufferedResponse;
//!
//! let dispatcher = Dispatcher::builder().body_limit(1024).build();
//! dispatcher.register([Endpoint::new("/pets/:id", "GET").with_handler(handler_fn(|w, req| {
//!     let id = route_params(&req).and_then(|p| p.get("id")).unwrap_or("?").to_string();
//!     let _ = w.write(id.as_bytes());
//! }))]);
//!
//! let mut rec = BufferedResponse::new();
//! let req = http::Request::get("/pets/7").body(Body::empty()).unwrap();
//! dispatcher.serve(&mut rec, req);
//! assert_eq!(rec.body_string(), "7");
//! ```

mod body;
mod context;
mod core;
mod index;
mod recovery;

pub use body::BodyTooLarge;
pub use context::{query_map, route_params};
pub use core::{Dispatcher, DispatcherBuilder};
pub use index::RouteIndex;
pub use recovery::{panic_message, PanicRecovery};
