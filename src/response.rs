//! Response sinks.
//!
//! [`ResponseWriter`] is the sink handlers write into. The dispatcher wraps
//! every sink in a [`TrackingWriter`] so that exactly one status line is ever
//! forwarded, whatever downstream code (or the panic guard) attempts.
//!
//! - [`TrackingWriter`] - single-status guard with byte accounting
//! - [`DiscardBody`] - keeps status and headers, drops body bytes (HEAD)
//! - [`BufferedResponse`] - in-memory sink used by the server adapter and tests

use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use std::fmt;
use std::io;
use tracing::debug;

/// Destination for a single HTTP response.
pub trait ResponseWriter {
    /// Response headers. Changes after the status is committed have no effect
    /// on the wire.
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line.
    fn write_header(&mut self, status: StatusCode);

    /// Write body bytes, committing `200 OK` first if no status was set.
    ///
    /// # Errors
    ///
    /// Returns the error from the underlying sink.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Whether a status has already been committed downstream.
    fn status_committed(&self) -> bool {
        false
    }
}

/// Decorator that forwards at most one status to the wrapped sink.
pub struct TrackingWriter<'a> {
    inner: &'a mut dyn ResponseWriter,
    wrote_header: bool,
    bytes_written: u64,
    write_failure: Option<io::ErrorKind>,
}

impl<'a> TrackingWriter<'a> {
    pub fn new(inner: &'a mut dyn ResponseWriter) -> Self {
        Self {
            inner,
            wrote_header: false,
            bytes_written: 0,
            write_failure: None,
        }
    }

    #[must_use]
    pub fn wrote_header(&self) -> bool {
        self.wrote_header
    }

    #[must_use]
    pub fn can_write_header(&self) -> bool {
        !self.wrote_header
    }

    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Kind of the first error returned by the wrapped sink, if any.
    #[must_use]
    pub fn write_failure(&self) -> Option<io::ErrorKind> {
        self.write_failure
    }
}

impl ResponseWriter for TrackingWriter<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.wrote_header {
            debug!(
                status = status.as_u16(),
                "Duplicate status write suppressed"
            );
            return;
        }
        self.wrote_header = true;
        self.inner.write_header(status);
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        match self.inner.write(data) {
            Ok(n) => {
                self.bytes_written += n as u64;
                Ok(n)
            }
            Err(e) => {
                if self.write_failure.is_none() {
                    self.write_failure = Some(e.kind());
                }
                Err(e)
            }
        }
    }

    fn status_committed(&self) -> bool {
        self.wrote_header
    }
}

/// Sink that keeps headers and status but swallows the body.
///
/// Used to answer HEAD requests with a GET handler.
pub struct DiscardBody<'a> {
    inner: &'a mut dyn ResponseWriter,
}

impl<'a> DiscardBody<'a> {
    pub fn new(inner: &'a mut dyn ResponseWriter) -> Self {
        Self { inner }
    }
}

impl ResponseWriter for DiscardBody<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.inner.write_header(status);
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        // The GET handler's status must still reach the client.
        if !self.inner.status_committed() {
            self.inner.write_header(StatusCode::OK);
        }
        Ok(data.len())
    }

    fn status_committed(&self) -> bool {
        self.inner.status_committed()
    }
}

/// In-memory response.
///
/// Records the first status it is given and appends every body write.
#[derive(Debug, Default, Clone)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl BufferedResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed status, `200 OK` if nothing was written.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossy.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Value of a header as a string, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Consume into `(status, headers, body)`.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status(), self.headers, self.body)
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    fn status_committed(&self) -> bool {
        self.status.is_some()
    }
}

/// Write a plain-text error using the status' canonical reason phrase.
pub fn write_error(w: &mut dyn ResponseWriter, status: StatusCode) {
    write_error_message(w, status, status.canonical_reason().unwrap_or("Error"));
}

/// Write a plain-text error with a custom message.
pub fn write_error_message(w: &mut dyn ResponseWriter, status: StatusCode, message: &str) {
    let headers = w.headers_mut();
    headers.remove(CONTENT_LENGTH);
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    w.write_header(status);
    let mut body = String::with_capacity(message.len() + 1);
    body.push_str(message);
    body.push('\n');
    if let Err(e) = w.write(body.as_bytes()) {
        debug!(status = status.as_u16(), error = %e, "Error body write failed");
    }
}

/// Failure while producing the final response.
#[derive(Debug)]
pub enum OutputError {
    /// The value could not be serialized.
    Encode(serde_json::Error),
    /// The sink rejected the bytes.
    Io(io::Error),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Encode(e) => write!(f, "response encoding failed: {e}"),
            OutputError::Io(e) => write!(f, "response write failed: {e}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Encode(e) => Some(e),
            OutputError::Io(e) => Some(e),
        }
    }
}

/// Serialize `value` as JSON and write it with `status`.
///
/// Serialization happens before anything is written, so an encoding failure
/// can still become a `500` when no status has been committed yet.
///
/// # Errors
///
/// [`OutputError::Encode`] if serialization fails, [`OutputError::Io`] if the
/// sink rejects the body.
pub fn write_json<T: Serialize + ?Sized>(
    w: &mut dyn ResponseWriter,
    status: StatusCode,
    value: &T,
) -> Result<(), OutputError> {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            if !w.status_committed() {
                write_error(w, StatusCode::INTERNAL_SERVER_ERROR);
            }
            return Err(OutputError::Encode(e));
        }
    };
    w.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    w.write_header(status);
    w.write(&bytes).map(|_| ()).map_err(OutputError::Io)
}
