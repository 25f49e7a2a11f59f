//! Endpoint definitions consumed by [`crate::dispatcher::Dispatcher::register`].

use crate::handler::SharedHandler;
use crate::middleware::{Middlewares, Stack};
use std::fmt;

/// A registrable route: pattern, method, middleware chain and handler.
///
/// The method is kept as a string and parsed at registration time, so
/// endpoints can be built from configuration. An endpoint without a handler
/// answers `501 Not Implemented`.
#[derive(Clone)]
pub struct Endpoint {
    url: String,
    method: String,
    middlewares: Middlewares,
    handler: Option<SharedHandler>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            middlewares: Middlewares::new(),
            handler: None,
        }
    }

    #[must_use]
    pub fn with_handler(mut self, handler: SharedHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_middlewares(mut self, middlewares: Middlewares) -> Self {
        self.middlewares = middlewares;
        self
    }

    /// Use the current contents of `stack` as the middleware chain.
    #[must_use]
    pub fn with_stack(self, stack: &Stack) -> Self {
        self.with_middlewares(stack.middlewares())
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn middlewares(&self) -> &Middlewares {
        &self.middlewares
    }

    #[must_use]
    pub fn handler(&self) -> Option<&SharedHandler> {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("middlewares", &self.middlewares)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
