use super::body::LimitedBody;
use super::context;
use super::index::RouteIndex;
use super::recovery::PanicRecovery;
use crate::endpoint::Endpoint;
use crate::event::{self, Event, EventEmitter, Severity, TracingEmitter};
use crate::handler::{not_found_handler, not_implemented_handler, Body, Handler, Request, SharedHandler};
use crate::middleware::Middleware;
use crate::query::{PlainDecoder, QueryDecoder, QueryMap};
use crate::response::{write_error, write_error_message, DiscardBody, ResponseWriter, TrackingWriter};
use crate::router::{allow_header, BuiltinRouter, RouteMatch, Router};
use crate::runtime_config::{RuntimeConfig, DEFAULT_MAX_BODY_BYTES};
use http::header::{HeaderValue, ALLOW, CONTENT_LENGTH};
use http::{Method, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, warn};

/// Builder for [`Dispatcher`]. Every option has a default.
pub struct DispatcherBuilder {
    router: Option<Box<dyn Router>>,
    query_decoder: Option<Arc<dyn QueryDecoder>>,
    not_found: Option<SharedHandler>,
    recoverer: Option<Arc<dyn Middleware>>,
    body_limit: i64,
    emitter: Option<Arc<dyn EventEmitter>>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            router: None,
            query_decoder: None,
            not_found: None,
            recoverer: None,
            body_limit: DEFAULT_MAX_BODY_BYTES,
            emitter: None,
        }
    }
}

impl DispatcherBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Router implementation. Default: [`BuiltinRouter`].
    #[must_use]
    pub fn router(mut self, router: Box<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// Default: [`PlainDecoder`].
    #[must_use]
    pub fn query_decoder(mut self, decoder: Arc<dyn QueryDecoder>) -> Self {
        self.query_decoder = Some(decoder);
        self
    }

    /// Handler for paths no method is registered for. Default: `404 Not Found`.
    #[must_use]
    pub fn not_found(mut self, handler: SharedHandler) -> Self {
        self.not_found = Some(handler);
        self
    }

    /// Layer wrapped around every resolved handler. Default: [`PanicRecovery`]
    /// bound to the dispatcher's emitter.
    #[must_use]
    pub fn recoverer(mut self, recoverer: Arc<dyn Middleware>) -> Self {
        self.recoverer = Some(recoverer);
        self
    }

    /// Maximum body size in bytes; `<= 0` disables the limit. Default: 2 MiB.
    #[must_use]
    pub fn body_limit(mut self, limit: i64) -> Self {
        self.body_limit = limit;
        self
    }

    /// Default: [`TracingEmitter`].
    #[must_use]
    pub fn event_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Apply values loaded by [`RuntimeConfig::from_env`].
    #[must_use]
    pub fn from_config(self, config: &RuntimeConfig) -> Self {
        self.body_limit(config.max_body_bytes)
    }

    #[must_use]
    pub fn build(self) -> Dispatcher {
        let emitter: Arc<dyn EventEmitter> = self.emitter.unwrap_or_else(|| Arc::new(TracingEmitter));
        let recoverer = self
            .recoverer
            .unwrap_or_else(|| Arc::new(PanicRecovery::new(Arc::clone(&emitter))));
        Dispatcher {
            router: RwLock::new(self.router.unwrap_or_else(|| Box::new(BuiltinRouter::new()))),
            index: RouteIndex::new(),
            query_decoder: self.query_decoder.unwrap_or_else(|| Arc::new(PlainDecoder)),
            not_found: self.not_found.unwrap_or_else(not_found_handler),
            recoverer,
            body_limit: self.body_limit,
            emitter,
        }
    }
}

/// The HTTP entry point: routes requests and applies body limits, panic
/// recovery and automatic HEAD/OPTIONS handling.
///
/// `Dispatcher` is `Send + Sync` and is shared behind an `Arc`. The router sits
/// behind a lock that is never held while a handler runs, so handlers may
/// register or unregister routes.
pub struct Dispatcher {
    router: RwLock<Box<dyn Router>>,
    index: RouteIndex,
    query_decoder: Arc<dyn QueryDecoder>,
    not_found: SharedHandler,
    recoverer: Arc<dyn Middleware>,
    body_limit: i64,
    emitter: Arc<dyn EventEmitter>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

enum BodyGuard {
    Unlimited,
    Limited(Arc<AtomicBool>),
    Rejected,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Configured body limit in bytes; `<= 0` means unlimited.
    #[must_use]
    pub fn body_limit(&self) -> i64 {
        self.body_limit
    }

    #[must_use]
    pub fn emitter(&self) -> &Arc<dyn EventEmitter> {
        &self.emitter
    }

    fn read_router(&self) -> RwLockReadGuard<'_, Box<dyn Router>> {
        self.router.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_router(&self) -> RwLockWriteGuard<'_, Box<dyn Router>> {
        self.router.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register endpoints.
    ///
    /// Each endpoint's middlewares are chained around its handler (or a
    /// `501 Not Implemented` responder), first middleware outermost. Endpoints
    /// with an invalid method or pattern are logged and skipped.
    pub fn register<I>(&self, endpoints: I)
    where
        I: IntoIterator<Item = Endpoint>,
    {
        for ep in endpoints {
            self.register_one(&ep);
        }
    }

    fn register_one(&self, ep: &Endpoint) {
        let Some(method) = parse_method(ep.method()) else {
            warn!(method = %ep.method(), url = %ep.url(), "Invalid HTTP method; endpoint skipped");
            return;
        };
        let handler = ep
            .handler()
            .map_or_else(not_implemented_handler, Arc::clone);
        let handler = ep.middlewares().chain(handler);

        if let Err(e) = self.write_router().register(method.clone(), ep.url(), handler) {
            error!(method = %method, url = %ep.url(), error = %e, "Route registration failed");
            self.emitter.emit(
                &Event::new(event::REGISTER_ERROR, format!("Route registration failed: {e}"))
                    .with_severity(Severity::Error)
                    .with("path", ep.url())
                    .with("method", method.as_str()),
            );
            return;
        }
        if ep.url().is_empty() {
            debug!(method = %method, "Empty URL; nothing registered");
            return;
        }
        self.index.insert(ep.url(), method.clone());
        self.emitter.emit(
            &Event::new(
                event::REGISTER_URL,
                format!("Registering URL: {} {}", ep.url(), method),
            )
            .with("path", ep.url())
            .with("method", method.as_str()),
        );
    }

    /// Remove a route from the router and the index. Unknown routes are ignored.
    pub fn unregister(&self, method: &str, pattern: &str) {
        let Some(method) = parse_method(method) else {
            return;
        };
        self.write_router().unregister(&method, pattern);
        self.index.remove(pattern, &method);
        debug!(method = %method, pattern = %pattern, "Route unregistered");
    }

    /// Allowed methods for a concrete path, in `Allow` header order.
    ///
    /// Uses the router's [`crate::router::MethodsFor`] capability when present,
    /// the dispatcher's own registration index otherwise.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        {
            let router = self.read_router();
            if let Some(mf) = router.as_methods_for() {
                return mf.methods_for(path);
            }
        }
        self.index.allowed_methods(path)
    }

    /// True when `path` is registered for some methods, but not for `method`.
    #[must_use]
    pub fn is_method_not_allowed(&self, method: &Method, path: &str) -> bool {
        let allowed = self.allowed_methods(path);
        !allowed.is_empty() && !allowed.contains(method)
    }

    /// Handle one request.
    pub fn serve(&self, w: &mut dyn ResponseWriter, mut req: Request) {
        let mut tw = TrackingWriter::new(w);
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let limit_flag = match self.guard_body(&mut req) {
            BodyGuard::Rejected => {
                self.emit_body_too_large(&method, &path, "declared");
                write_error_message(
                    &mut tw,
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Request body too large",
                );
                self.report_output(&tw, &method, &path);
                return;
            }
            BodyGuard::Limited(flag) => Some(flag),
            BodyGuard::Unlimited => None,
        };

        self.route(&mut tw, req, &method, &path);

        if limit_flag.is_some_and(|f| f.load(Ordering::Acquire)) {
            self.emit_body_too_large(&method, &path, "streamed");
            if tw.can_write_header() {
                write_error_message(
                    &mut tw,
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Request body too large",
                );
            }
        }
        self.report_output(&tw, &method, &path);
        debug!(
            method = %method,
            path = %path,
            bytes = tw.bytes_written(),
            "Request dispatched"
        );
    }

    fn guard_body(&self, req: &mut Request) -> BodyGuard {
        let Ok(limit) = u64::try_from(self.body_limit) else {
            return BodyGuard::Unlimited;
        };
        if limit == 0 {
            return BodyGuard::Unlimited;
        }
        let declared = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if declared.is_some_and(|len| len > limit) {
            return BodyGuard::Rejected;
        }
        let flag = Arc::new(AtomicBool::new(false));
        let body = std::mem::take(req.body_mut());
        *req.body_mut() = Body::from_reader(LimitedBody::new(body, limit, Arc::clone(&flag)));
        BodyGuard::Limited(flag)
    }

    fn route(&self, w: &mut dyn ResponseWriter, mut req: Request, method: &Method, path: &str) {
        if let Some(m) = self.lookup(method, path) {
            self.invoke(w, req, m);
            return;
        }

        if *method == Method::OPTIONS {
            let allowed = self.allowed_methods(path);
            if !allowed.is_empty() {
                set_allow(w, &allowed);
                w.write_header(StatusCode::NO_CONTENT);
                return;
            }
        }

        if *method == Method::HEAD {
            if let Some(m) = self.lookup(&Method::GET, path) {
                *req.method_mut() = Method::GET;
                let mut discard = DiscardBody::new(w);
                self.invoke(&mut discard, req, m);
                return;
            }
        }

        let allowed = self.allowed_methods(path);
        if !allowed.is_empty() && !allowed.contains(method) {
            set_allow(w, &allowed);
            write_error(w, StatusCode::METHOD_NOT_ALLOWED);
            self.emitter.emit(
                &Event::new(
                    event::METHOD_NOT_ALLOWED,
                    format!("Method not allowed: {method} {path}"),
                )
                .with_severity(Severity::Debug)
                .with("path", path)
                .with("method", method.as_str())
                .with("allow", allow_header(&allowed))
                .with_request_id(context::header_request_id(&req).as_ref()),
            );
            return;
        }

        self.emitter.emit(
            &Event::new(event::NOT_FOUND, format!("Not found: {method} {path}"))
                .with_severity(Severity::Debug)
                .with("path", path)
                .with("method", method.as_str())
                .with_request_id(context::header_request_id(&req).as_ref()),
        );
        self.recoverer
            .wrap(Arc::clone(&self.not_found))
            .serve(w, req);
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.read_router().match_route(method, path)
    }

    fn invoke(&self, w: &mut dyn ResponseWriter, mut req: Request, m: RouteMatch) {
        let query = match self.query_decoder.decode(req.uri().query().unwrap_or("")) {
            Ok(q) => q,
            Err(e) => {
                self.emitter.emit(
                    &Event::new(event::QUERY_DECODE_ERROR, e.to_string())
                        .with_severity(Severity::Warn)
                        .with("path", req.uri().path()),
                );
                QueryMap::new()
            }
        };
        context::attach(&mut req, query, m.params);
        self.recoverer.wrap(m.handler).serve(w, req);
    }

    fn emit_body_too_large(&self, method: &Method, path: &str, detected: &str) {
        self.emitter.emit(
            &Event::new(event::BODY_TOO_LARGE, "Request body too large")
                .with_severity(Severity::Warn)
                .with("path", path)
                .with("method", method.as_str())
                .with("limit", self.body_limit)
                .with("detected", detected),
        );
    }

    fn report_output(&self, tw: &TrackingWriter<'_>, method: &Method, path: &str) {
        if let Some(kind) = tw.write_failure() {
            self.emitter.emit(
                &Event::new(event::OUTPUT_ERROR, format!("Response write failed: {kind}"))
                    .with_severity(Severity::Error)
                    .with("path", path)
                    .with("method", method.as_str())
                    .with("bytes_written", tw.bytes_written()),
            );
        }
    }
}

impl Handler for Dispatcher {
    fn serve(&self, w: &mut dyn ResponseWriter, req: Request) {
        Dispatcher::serve(self, w, req);
    }
}

fn parse_method(method: &str) -> Option<Method> {
    if method.is_empty() {
        return None;
    }
    Method::from_bytes(method.as_bytes()).ok()
}

fn set_allow(w: &mut dyn ResponseWriter, allowed: &[Method]) {
    if let Ok(value) = HeaderValue::from_str(&allow_header(allowed)) {
        w.headers_mut().insert(ALLOW, value);
    }
}
