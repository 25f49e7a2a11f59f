use super::context::header_request_id;
use crate::event::{self, Event, EventEmitter, Severity};
use crate::handler::{handler_fn, SharedHandler};
use crate::middleware::Middleware;
use crate::response::write_error;
use http::StatusCode;
use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, warn};

/// Default recoverer: turns a handler panic into `500 Internal Server Error`.
///
/// The panic message and a backtrace go to the log and to an `event_panic`
/// event. The response body only ever carries the generic reason phrase. If
/// the handler already committed a status, nothing more is written.
pub struct PanicRecovery {
    emitter: Arc<dyn EventEmitter>,
}

impl PanicRecovery {
    pub fn new(emitter: Arc<dyn EventEmitter>) -> Self {
        Self { emitter }
    }
}

/// Best-effort text of a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Middleware for PanicRecovery {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let emitter = Arc::clone(&self.emitter);
        handler_fn(move |w, req| {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();
            let request_id = header_request_id(&req);

            let Err(payload) = catch_unwind(AssertUnwindSafe(|| next.serve(&mut *w, req))) else {
                return;
            };
            let message = panic_message(&*payload);
            let backtrace = Backtrace::force_capture();
            error!(
                method = %method,
                path = %path,
                panic_message = %message,
                backtrace = %backtrace,
                "Handler panicked"
            );
            emitter.emit(
                &Event::new(event::PANIC, format!("Panic recovered: {message}"))
                    .with_severity(Severity::Error)
                    .with("panic", message)
                    .with("backtrace", backtrace.to_string())
                    .with("method", method.as_str())
                    .with("path", path.as_str())
                    .with_request_id(request_id.as_ref()),
            );
            if w.status_committed() {
                warn!(path = %path, "Status already sent before panic; response left as is");
            } else {
                write_error(w, StatusCode::INTERNAL_SERVER_ERROR);
            }
        })
    }
}
