//! Request, body and handler types shared by the router and the dispatcher.
//!
//! A request is a plain [`http::Request`] whose body is a streaming [`Body`].
//! Handlers receive the request by value together with a mutable
//! [`ResponseWriter`] and write their response through it.

use crate::response::ResponseWriter;
use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

/// Request type flowing through the dispatcher.
pub type Request = http::Request<Body>;

/// Streaming request body.
///
/// Owns any `Read + Send` source. The dispatcher swaps the body for a
/// size-limited reader before the handler runs, so handlers should treat
/// read errors as terminal.
pub struct Body {
    reader: Box<dyn Read + Send>,
}

impl Body {
    /// Body with no content.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_reader(io::empty())
    }

    /// Wrap an arbitrary reader.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    /// Read the remaining body into a byte vector.
    ///
    /// # Errors
    ///
    /// Propagates reader errors, including [`crate::dispatcher::BodyTooLarge`]
    /// when the configured limit is exceeded.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::from_reader(Cursor::new(s.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}

/// Anything that can answer a request.
pub trait Handler: Send + Sync {
    fn serve(&self, w: &mut dyn ResponseWriter, req: Request);
}

/// Shared, type-erased handler as stored in route tables.
pub type SharedHandler = Arc<dyn Handler>;

struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, Request) + Send + Sync,
{
    fn serve(&self, w: &mut dyn ResponseWriter, req: Request) {
        (self.0)(w, req)
    }
}

/// Turn a closure into a [`SharedHandler`].
///
/// ```rust
/// use brrtdispatch::handler::handler_fn;
/// use http::StatusCode;
///
/// let h = handler_fn(|w, _req| {
///     w.write_header(StatusCode::NO_CONTENT);
/// });
/// # drop(h);
/// ```
pub fn handler_fn<F>(f: F) -> SharedHandler
where
    F: Fn(&mut dyn ResponseWriter, Request) + Send + Sync + 'static,
{
    Arc::new(HandlerFn(f))
}

/// Handler used for endpoints registered without one: `501 Not Implemented`.
#[must_use]
pub fn not_implemented_handler() -> SharedHandler {
    handler_fn(|w, _req| {
        crate::response::write_error(w, http::StatusCode::NOT_IMPLEMENTED);
    })
}

/// Default not-found responder: `404 Not Found`.
#[must_use]
pub fn not_found_handler() -> SharedHandler {
    handler_fn(|w, _req| {
        crate::response::write_error(w, http::StatusCode::NOT_FOUND);
    })
}
