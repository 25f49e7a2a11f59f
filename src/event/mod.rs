//! # Event Module
//!
//! Structured notifications emitted by the dispatcher: registrations,
//! not-found and method-not-allowed outcomes, recovered panics, body-limit
//! violations and output failures.
//!
//! The dispatcher talks to an [`EventEmitter`]. The default is
//! [`TracingEmitter`], which turns each event into a `tracing` record.
//! [`ListenerEmitter`] fans out to callbacks, and [`AsyncEmitter`] moves
//! delivery off the request path.
//!
//! ```rust
//! use brrtdispatch::event::{self, Event, EventEmitter, ListenerEmitter};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let emitter = ListenerEmitter::new();
//! let panics = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&panics);
//! emitter.register_listener(event::PANIC, move |_e| {
//!     seen.fetch_add(1, Ordering::SeqCst);
//! });
//! emitter.emit(&Event::new(event::PANIC, "boom"));
//! emitter.emit(&Event::new(event::NOT_FOUND, "nope"));
//! assert_eq!(panics.load(Ordering::SeqCst), 1);
//! ```

mod core;
mod emitter;

pub use core::{
    Event, EventType, Severity, BODY_TOO_LARGE, METHOD_NOT_ALLOWED, NOT_FOUND, OUTPUT_ERROR,
    PANIC, QUERY_DECODE_ERROR, REGISTER_ERROR, REGISTER_URL, SERVER_START, SERVER_STOP,
};
pub use emitter::{
    AsyncEmitter, EventEmitter, ListenerEmitter, ListenerId, NoopEmitter, TracingEmitter,
};

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collector() -> (Arc<ListenerEmitter>, Arc<Mutex<Vec<Event>>>) {
        let emitter = Arc::new(ListenerEmitter::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        emitter.register_global_listener(move |e| sink.lock().unwrap().push(e.clone()));
        (emitter, seen)
    }

    #[test]
    fn test_event_builders() {
        let e = Event::new(PANIC, "Panic recovered")
            .with_severity(Severity::Error)
            .with("panic", "boom");
        assert_eq!(e.event_type.as_str(), "event_panic");
        assert_eq!(e.data_str("panic"), Some("boom"));
        assert_eq!(e.severity, Severity::Error);
    }

    #[test]
    fn test_listener_routing_and_removal() {
        let emitter = ListenerEmitter::new();
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        let id = emitter.register_listener(NOT_FOUND, move |_| *h.lock().unwrap() += 1);
        emitter.emit(&Event::new(NOT_FOUND, "a"));
        emitter.emit(&Event::new(PANIC, "b"));
        assert_eq!(*hits.lock().unwrap(), 1);
        emitter.remove_listener(id);
        assert_eq!(emitter.listener_count(), 0);
        emitter.emit(&Event::new(NOT_FOUND, "c"));
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let (emitter, seen) = collector();
        emitter.register_global_listener(|_| panic!("listener bug"));
        emitter.emit(&Event::new(REGISTER_URL, "x"));
        emitter.emit(&Event::new(REGISTER_URL, "y"));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_async_emitter_delivers_before_drop_completes() {
        let (inner, seen) = collector();
        let inner_dyn: Arc<dyn EventEmitter> = inner;
        let emitter = AsyncEmitter::spawn(inner_dyn, 16).unwrap();
        for i in 0..5 {
            emitter.emit(&Event::new(REGISTER_URL, format!("e{i}")));
        }
        drop(emitter);
        let got: Vec<String> = seen.lock().unwrap().iter().map(|e| e.message.clone()).collect();
        assert_eq!(got, vec!["e0", "e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn test_noop_and_tracing_emitters_accept_events() {
        let e = Event::new(SERVER_START, "start").with_severity(Severity::Warn);
        NoopEmitter.emit(&e);
        TracingEmitter.emit(&e);
    }
}
