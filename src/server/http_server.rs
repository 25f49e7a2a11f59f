use crate::dispatcher::{panic_message, Dispatcher};
use crate::event::{self, Event};
use crate::handler::{Body, Request};
use crate::response::BufferedResponse;
use crate::runtime_config::DEFAULT_WORKERS;
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Serves a [`Dispatcher`] over HTTP/1.1 using `tiny_http`.
///
/// A fixed number of worker threads pull requests from one listener; each
/// request is buffered, dispatched, and answered from the buffered response.
pub struct HttpServer {
    dispatcher: Arc<Dispatcher>,
    workers: usize,
}

/// Handle to a running [`HttpServer`].
pub struct ServerHandle {
    addr: SocketAddr,
    server: Arc<tiny_http::Server>,
    workers: Vec<JoinHandle<()>>,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Number of worker threads (at least 1).
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bind `addr` and start the workers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be resolved or bound, or a
    /// worker thread cannot be spawned.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address"))?;
        let server = tiny_http::Server::http(addr).map_err(io::Error::other)?;
        let bound = server.server_addr().to_ip().unwrap_or(addr);
        let server = Arc::new(server);

        let mut workers = Vec::with_capacity(self.workers);
        for n in 0..self.workers {
            let server = Arc::clone(&server);
            let dispatcher = Arc::clone(&self.dispatcher);
            let handle = thread::Builder::new()
                .name(format!("brrtdispatch-worker-{n}"))
                .spawn(move || worker_loop(&server, &dispatcher))?;
            workers.push(handle);
        }

        info!(addr = %bound, workers = self.workers, "HTTP server started");
        self.dispatcher.emitter().emit(
            &Event::new(event::SERVER_START, "Starting HTTP server")
                .with("addr", bound.to_string())
                .with("workers", self.workers),
        );
        Ok(ServerHandle {
            addr: bound,
            server,
            workers,
            dispatcher: self.dispatcher,
        })
    }
}

impl ServerHandle {
    /// The bound address (useful with port `0`).
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until the listener accepts TCP connections.
    ///
    /// # Errors
    ///
    /// `TimedOut` if the server is not reachable within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting work and join every worker.
    pub fn stop(self) {
        for _ in &self.workers {
            self.server.unblock();
        }
        let count = self.workers.len();
        for worker in self.workers {
            if worker.join().is_err() {
                warn!("Worker thread panicked during shutdown");
            }
        }
        info!(addr = %self.addr, workers = count, "HTTP server stopped");
        self.dispatcher.emitter().emit(
            &Event::new(event::SERVER_STOP, "HTTP server shut down")
                .with("addr", self.addr.to_string()),
        );
    }

    /// Block until every worker exits.
    ///
    /// # Errors
    ///
    /// Returns the panic payload of the first worker that panicked.
    pub fn join(self) -> thread::Result<()> {
        for worker in self.workers {
            worker.join()?;
        }
        Ok(())
    }
}

fn worker_loop(server: &tiny_http::Server, dispatcher: &Dispatcher) {
    loop {
        match server.recv() {
            Ok(rq) => {
                // An unanswered request is sent a 500 by tiny_http on drop.
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handle(dispatcher, rq))) {
                    error!(
                        panic_message = %panic_message(&*payload),
                        "Request handling panicked outside handler recovery"
                    );
                }
            }
            Err(e) => {
                debug!(error = %e, "Listener closed; worker exiting");
                break;
            }
        }
    }
}

fn handle(dispatcher: &Dispatcher, mut rq: tiny_http::Request) {
    let req = match to_request(&mut rq, dispatcher.body_limit()) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, url = %rq.url(), "Malformed request");
            let resp = tiny_http::Response::from_string("Bad Request\n").with_status_code(400);
            if let Err(e) = rq.respond(resp) {
                debug!(error = %e, "Failed to send 400");
            }
            return;
        }
    };

    let mut out = BufferedResponse::new();
    dispatcher.serve(&mut out, req);

    let (status, headers, body) = out.into_parts();
    let mut resp = tiny_http::Response::from_data(body).with_status_code(status.as_u16());
    for (name, value) in &headers {
        // Framing headers are computed by tiny_http.
        if *name == CONTENT_LENGTH || *name == TRANSFER_ENCODING || *name == CONNECTION {
            continue;
        }
        match tiny_http::Header::from_bytes(name.as_str().as_bytes(), value.as_bytes()) {
            Ok(h) => resp.add_header(h),
            Err(()) => debug!(header = %name, "Header not representable; dropped"),
        }
    }
    if let Err(e) = rq.respond(resp) {
        warn!(error = %e, status = status.as_u16(), "Failed to write response");
        dispatcher.emitter().emit(
            &Event::new(event::OUTPUT_ERROR, format!("Response write failed: {e}"))
                .with_severity(event::Severity::Error)
                .with("status", status.as_u16()),
        );
    }
}

/// Convert a `tiny_http` request, buffering at most `limit + 1` body bytes.
///
/// A declared length above the limit skips the read; the dispatcher rejects
/// such requests from the header alone.
fn to_request(rq: &mut tiny_http::Request, limit: i64) -> io::Result<Request> {
    let mut builder = http::Request::builder()
        .method(rq.method().to_string().as_str())
        .uri(rq.url());
    for h in rq.headers() {
        builder = builder.header(h.field.as_str().as_str(), h.value.as_str());
    }

    let limit = u64::try_from(limit).ok().filter(|l| *l > 0);
    let declared = rq.body_length().map(|n| n as u64);
    let mut buf = Vec::new();
    match limit {
        Some(l) if declared.is_some_and(|d| d > l) => {}
        Some(l) => {
            rq.as_reader().take(l.saturating_add(1)).read_to_end(&mut buf)?;
        }
        None => {
            rq.as_reader().read_to_end(&mut buf)?;
        }
    }

    builder
        .body(Body::from(buf))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
