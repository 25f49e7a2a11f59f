//! # brrtdispatch
//!
//! A small, deterministic HTTP request router and dispatcher.
//!
//! Routes are registered as (method, pattern) pairs. Incoming requests are
//! matched to a handler, path parameters are extracted, and a few
//! cross-cutting policies are enforced at a single entry point.
//!
//! ## Architecture
//!
//! - **[`router`]** - pattern compilation, the [`router::Router`] trait and the
//!   built-in exact-plus-ordered-params route table
//! - **[`dispatcher`]** - the request pipeline: body limits, automatic
//!   HEAD/OPTIONS, 405 with `Allow`, panic recovery, context injection
//! - **[`response`]** - response sinks, including the single-status
//!   [`response::TrackingWriter`]
//! - **[`middleware`]** - handler wrappers, chains and editable stacks
//! - **[`event`]** - structured notifications emitted by the dispatcher
//! - **[`server`]** - blocking HTTP/1.1 front end on `tiny_http`
//! - **[`app`]** - `get`/`post`/... helpers over a dispatcher
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as HttpServer<br/>(tiny_http)
//!     participant Dispatcher
//!     participant Router
//!     participant Recovery as PanicRecovery
//!     participant Handler
//!
//!     Client->>Server: GET /pets/123
//!     Server->>Dispatcher: serve(BufferedResponse, Request)
//!     Dispatcher->>Dispatcher: TrackingWriter + body guard
//!     alt Content-Length over limit
//!         Dispatcher-->>Client: 413 Request body too large
//!     end
//!     Dispatcher->>Router: match_route(GET, /pets/123)
//!     alt No match
//!         Dispatcher->>Dispatcher: OPTIONS → 204 + Allow
//!         Dispatcher->>Router: HEAD → retry as GET, discard body
//!         Dispatcher-->>Client: 405 + Allow, or 404
//!     end
//!     Router-->>Dispatcher: RouteMatch {handler, params}
//!     Dispatcher->>Dispatcher: attach QueryMap + Params
//!     Dispatcher->>Recovery: wrap(handler)
//!     Recovery->>Handler: serve(w, req)
//!     alt Handler panics
//!         Recovery-->>Client: 500 Internal Server Error
//!     end
//!     Handler-->>Client: response
//! ```
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::app::App;
//! use brrtdispatch::handler::Body;
//! use brrtdispatch::response::BufferedResponse;
//! use http::StatusCode;
//!
//! let app = App::new();
//! app.get("/a", |w, _req| { let _ = w.write(b"get"); });
//! app.post("/a", |w, _req| w.write_header(StatusCode::CREATED));
//!
//! let mut rec = BufferedResponse::new();
//! let req = http::Request::delete("/a").body(Body::empty()).unwrap();
//! app.dispatcher().serve(&mut rec, req);
//! assert_eq!(rec.status(), StatusCode::METHOD_NOT_ALLOWED);
//! assert_eq!(rec.header("allow"), Some("OPTIONS, GET, HEAD, POST"));
//! ```

pub mod app;
pub mod dispatcher;
pub mod endpoint;
pub mod event;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use app::App;
pub use dispatcher::{query_map, route_params, Dispatcher, DispatcherBuilder};
pub use endpoint::Endpoint;
pub use handler::{handler_fn, Body, Handler, Request, SharedHandler};
pub use response::{BufferedResponse, ResponseWriter};
pub use router::{BuiltinRouter, Params, RouteMatch, Router};
