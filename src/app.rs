//! Convenience facade over [`Dispatcher`].
//!
//! ```rust
//! use brrtdispatch::app::App;
//! use brrtdispatch::handler::Body;
//! use brrtdispatch::response::BufferedResponse;
//!
//! let app = App::new();
//! let ep = app.get("/hello", |w, _req| {
//!     let _ = w.write(b"hi");
//! });
//! // Moving the endpoint re-registers it under the new URL.
//! let ep = ep.with_url("/greet");
//! assert_eq!(ep.url(), "/greet");
//!
//! let mut rec = BufferedResponse::new();
//! app.dispatcher()
//!     .serve(&mut rec, http::Request::get("/greet").body(Body::empty()).unwrap());
//! assert_eq!(rec.body_string(), "hi");
//! ```

use crate::dispatcher::{Dispatcher, DispatcherBuilder};
use crate::endpoint::Endpoint;
use crate::handler::{handler_fn, Request, SharedHandler};
use crate::middleware::Middlewares;
use crate::response::ResponseWriter;
use http::Method;
use std::sync::Arc;

/// A dispatcher plus method helpers that register endpoints directly.
#[derive(Clone)]
pub struct App {
    dispatcher: Arc<Dispatcher>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// App over a default dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::from_builder(Dispatcher::builder())
    }

    #[must_use]
    pub fn from_builder(builder: DispatcherBuilder) -> Self {
        Self {
            dispatcher: Arc::new(builder.build()),
        }
    }

    /// Shared dispatcher, e.g. for [`crate::server::HttpServer::new`].
    #[must_use]
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn get<F>(&self, path: &str, f: F) -> RegisteredEndpoint
    where
        F: Fn(&mut dyn ResponseWriter, Request) + Send + Sync + 'static,
    {
        self.route(Method::GET, path, handler_fn(f))
    }

    pub fn post<F>(&self, path: &str, f: F) -> RegisteredEndpoint
    where
        F: Fn(&mut dyn ResponseWriter, Request) + Send + Sync + 'static,
    {
        self.route(Method::POST, path, handler_fn(f))
    }

    pub fn put<F>(&self, path: &str, f: F) -> RegisteredEndpoint
    where
        F: Fn(&mut dyn ResponseWriter, Request) + Send + Sync + 'static,
    {
        self.route(Method::PUT, path, handler_fn(f))
    }

    pub fn patch<F>(&self, path: &str, f: F) -> RegisteredEndpoint
    where
        F: Fn(&mut dyn ResponseWriter, Request) + Send + Sync + 'static,
    {
        self.route(Method::PATCH, path, handler_fn(f))
    }

    pub fn delete<F>(&self, path: &str, f: F) -> RegisteredEndpoint
    where
        F: Fn(&mut dyn ResponseWriter, Request) + Send + Sync + 'static,
    {
        self.route(Method::DELETE, path, handler_fn(f))
    }

    /// Register a handler for any method.
    pub fn route(&self, method: Method, path: &str, handler: SharedHandler) -> RegisteredEndpoint {
        let endpoint = Endpoint::new(path, method.as_str()).with_handler(handler);
        self.dispatcher.register([endpoint.clone()]);
        RegisteredEndpoint {
            dispatcher: Arc::clone(&self.dispatcher),
            endpoint,
        }
    }
}

/// An endpoint that is live in a dispatcher.
///
/// Each `with_*` call unregisters the current route and registers the
/// updated one.
pub struct RegisteredEndpoint {
    dispatcher: Arc<Dispatcher>,
    endpoint: Endpoint,
}

impl RegisteredEndpoint {
    fn replace(mut self, update: impl FnOnce(Endpoint) -> Endpoint) -> Self {
        self.dispatcher
            .unregister(self.endpoint.method(), self.endpoint.url());
        self.endpoint = update(self.endpoint);
        self.dispatcher.register([self.endpoint.clone()]);
        self
    }

    pub fn with_url(self, url: &str) -> Self {
        self.replace(|ep| ep.with_url(url))
    }

    pub fn with_method(self, method: Method) -> Self {
        self.replace(|ep| ep.with_method(method.as_str()))
    }

    pub fn with_middlewares(self, middlewares: Middlewares) -> Self {
        self.replace(|ep| ep.with_middlewares(middlewares))
    }

    pub fn with_handler<F>(self, f: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, Request) + Send + Sync + 'static,
    {
        self.replace(|ep| ep.with_handler(handler_fn(f)))
    }

    #[must_use]
    pub fn url(&self) -> &str {
        self.endpoint.url()
    }

    #[must_use]
    pub fn method(&self) -> &str {
        self.endpoint.method()
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}
