use crate::handler::{handler_fn, SharedHandler};
use crate::response::ResponseWriter;
use http::{HeaderMap, StatusCode};
use std::io;
use std::time::Instant;
use tracing::{field, info, info_span};

/// Runs the wrapped handler inside a `request` span and logs the outcome.
///
/// The span carries `method` and `path`; `status` and `latency_ms` are
/// recorded once the handler returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

struct StatusCapture<'a> {
    inner: &'a mut dyn ResponseWriter,
    status: Option<StatusCode>,
}

impl ResponseWriter for StatusCapture<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
        self.inner.write_header(status);
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.inner.write(data)
    }

    fn status_committed(&self) -> bool {
        self.status.is_some() || self.inner.status_committed()
    }
}

/// Status the client receives; a handler that writes nothing gets an implicit 200.
fn reported_status(captured: Option<StatusCode>) -> u16 {
    captured.unwrap_or(StatusCode::OK).as_u16()
}

impl super::Middleware for TracingMiddleware {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        handler_fn(move |w, req| {
            let span = info_span!(
                "request",
                method = %req.method(),
                path = %req.uri().path(),
                status = field::Empty,
                latency_ms = field::Empty,
            );
            let _guard = span.enter();
            let start = Instant::now();
            let mut capture = StatusCapture {
                inner: w,
                status: None,
            };
            next.serve(&mut capture, req);
            let status = reported_status(capture.status);
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            span.record("status", status);
            span.record("latency_ms", latency_ms);
            info!(status, latency_ms, "Request completed");
        })
    }
}
