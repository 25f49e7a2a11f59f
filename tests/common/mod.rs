#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use brrtdispatch::event::{Event, EventEmitter, EventType};
use brrtdispatch::handler::{handler_fn, Body, Request, SharedHandler};
use brrtdispatch::response::BufferedResponse;
use brrtdispatch::Dispatcher;
use std::sync::{Arc, Mutex};

/// Build a request with an empty body.
pub fn request(method: &str, uri: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn request_with_body(method: &str, uri: &str, body: impl Into<Body>) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

pub fn dispatch(dispatcher: &Dispatcher, req: Request) -> BufferedResponse {
    let mut rec = BufferedResponse::new();
    dispatcher.serve(&mut rec, req);
    rec
}

/// Handler that writes a fixed body.
pub fn text(body: &'static str) -> SharedHandler {
    handler_fn(move |w, _req| {
        w.write(body.as_bytes()).unwrap();
    })
}

/// Emitter that keeps every event for inspection.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Shared handle for [`brrtdispatch::DispatcherBuilder::event_emitter`].
    pub fn emitter(self: &Arc<Self>) -> Arc<dyn EventEmitter> {
        let this: Arc<Self> = Arc::clone(self);
        this
    }

    pub fn of_type(&self, event_type: &EventType) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn count(&self, event_type: &EventType) -> usize {
        self.of_type(event_type).len()
    }
}

impl EventEmitter for EventLog {
    fn emit(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub mod http_client {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Parsed raw HTTP/1.1 response.
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Send a raw request (must ask for `Connection: close`) and read until EOF.
    pub fn send_request(addr: &SocketAddr, raw: &str) -> RawResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        parse(&String::from_utf8_lossy(&buf))
    }

    fn parse(resp: &str) -> RawResponse {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        RawResponse {
            status,
            headers,
            body: body.to_string(),
        }
    }
}
