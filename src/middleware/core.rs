use crate::handler::SharedHandler;
use std::fmt;
use std::sync::Arc;

/// Wraps a handler in another handler.
///
/// Any `Fn(SharedHandler) -> SharedHandler` closure is a middleware.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: SharedHandler) -> SharedHandler;
}

impl<F> Middleware for F
where
    F: Fn(SharedHandler) -> SharedHandler + Send + Sync,
{
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        self(next)
    }
}

/// Ordered middleware list. The first entry is the outermost layer.
#[derive(Clone, Default)]
pub struct Middlewares(Vec<Arc<dyn Middleware>>);

impl Middlewares {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware (it becomes the innermost layer).
    #[must_use]
    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.0.push(Arc::new(middleware));
        self
    }

    /// Append an already shared middleware.
    #[must_use]
    pub fn add_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.0.push(middleware);
        self
    }

    /// Compose every layer around `handler`.
    #[must_use]
    pub fn chain(&self, handler: SharedHandler) -> SharedHandler {
        self.0.iter().rev().fold(handler, |h, m| m.wrap(h))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Arc<dyn Middleware>>> for Middlewares {
    fn from(list: Vec<Arc<dyn Middleware>>) -> Self {
        Self(list)
    }
}

impl fmt::Debug for Middlewares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middlewares")
            .field("len", &self.0.len())
            .finish()
    }
}
