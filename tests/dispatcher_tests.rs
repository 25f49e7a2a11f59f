#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brrtdispatch::dispatcher::{query_map, route_params};
use brrtdispatch::event;
use brrtdispatch::handler::{handler_fn, Request, SharedHandler};
use brrtdispatch::query::QueryValue;
use brrtdispatch::router::{RouteError, RouteMatch, Router};
use brrtdispatch::{BuiltinRouter, Dispatcher, Endpoint};
use common::{dispatch, request, text, EventLog};
use http::{Method, StatusCode};
use std::sync::{Arc, Mutex};

fn get_post_dispatcher() -> Dispatcher {
    let d = Dispatcher::new();
    d.register([
        Endpoint::new("/a", "GET").with_handler(text("get")),
        Endpoint::new("/a", "POST").with_handler(text("post")),
    ]);
    d
}

#[test]
fn test_options_delete_missing_scenario() {
    let d = get_post_dispatcher();

    let rec = dispatch(&d, request("OPTIONS", "/a"));
    assert_eq!(rec.status(), StatusCode::NO_CONTENT);
    assert_eq!(rec.header("allow"), Some("OPTIONS, GET, HEAD, POST"));
    assert!(rec.body().is_empty());

    let rec = dispatch(&d, request("DELETE", "/a"));
    assert_eq!(rec.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(rec.header("allow"), Some("OPTIONS, GET, HEAD, POST"));

    let rec = dispatch(&d, request("GET", "/missing"));
    assert_eq!(rec.status(), StatusCode::NOT_FOUND);
    assert_eq!(rec.body_string(), "Not Found\n");
}

#[test]
fn test_allow_order_independent_of_registration_order() {
    let d = Dispatcher::new();
    d.register([
        Endpoint::new("/x", "POST").with_handler(text("p")),
        Endpoint::new("/x", "GET").with_handler(text("g")),
    ]);
    let rec = dispatch(&d, request("OPTIONS", "/x"));
    assert_eq!(rec.header("allow"), Some("OPTIONS, GET, HEAD, POST"));
}

#[test]
fn test_matched_handler_runs() {
    let d = get_post_dispatcher();
    assert_eq!(dispatch(&d, request("GET", "/a")).body_string(), "get");
    assert_eq!(dispatch(&d, request("POST", "/a")).body_string(), "post");
}

#[test]
fn test_params_and_query_injected() {
    let seen: Arc<Mutex<Option<(String, Option<QueryValue>)>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let d = Dispatcher::new();
    d.register([Endpoint::new("/users/:id", "GET").with_handler(handler_fn(
        move |w, req| {
            let id = route_params(&req).unwrap().get("id").unwrap().to_string();
            let tags = query_map(&req).unwrap().get("tag").cloned();
            *sink.lock().unwrap() = Some((id, tags));
            w.write_header(StatusCode::OK);
        },
    ))]);

    let rec = dispatch(&d, request("GET", "/users/42?tag=a&tag=b"));
    assert_eq!(rec.status(), StatusCode::OK);
    let (id, tags) = seen.lock().unwrap().take().unwrap();
    assert_eq!(id, "42");
    assert_eq!(tags, Some(QueryValue::Multi(vec!["a".into(), "b".into()])));
}

#[test]
fn test_exact_match_has_query_but_no_params() {
    let d = Dispatcher::new();
    d.register([Endpoint::new("/plain", "GET").with_handler(handler_fn(|w, req| {
        assert!(route_params(&req).is_none());
        let q = query_map(&req).unwrap();
        assert!(q.is_empty());
        w.write_header(StatusCode::NO_CONTENT);
    }))]);
    assert_eq!(dispatch(&d, request("GET", "/plain")).status(), StatusCode::NO_CONTENT);
}

#[test]
fn test_endpoint_without_handler_is_501() {
    let d = Dispatcher::new();
    d.register([Endpoint::new("/todo", "GET")]);
    let rec = dispatch(&d, request("GET", "/todo"));
    assert_eq!(rec.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(rec.body_string(), "Not Implemented\n");
}

#[test]
fn test_invalid_method_and_duplicate_param_are_skipped() {
    let log = EventLog::new();
    let d = Dispatcher::builder().event_emitter(log.emitter()).build();
    d.register([
        Endpoint::new("/bad", "").with_handler(text("x")),
        Endpoint::new("/bad", "GE T").with_handler(text("x")),
        Endpoint::new("/dup/:id/:id", "GET").with_handler(text("x")),
        Endpoint::new("/ok", "GET").with_handler(text("ok")),
    ]);
    assert_eq!(log.count(&event::REGISTER_URL), 1);
    assert_eq!(log.count(&event::REGISTER_ERROR), 1);
    assert_eq!(dispatch(&d, request("GET", "/bad")).status(), StatusCode::NOT_FOUND);
    assert_eq!(dispatch(&d, request("GET", "/ok")).body_string(), "ok");
}

#[test]
fn test_register_event_carries_url_and_method() {
    let log = EventLog::new();
    let d = Dispatcher::builder().event_emitter(log.emitter()).build();
    d.register([Endpoint::new("/r/:id", "PUT").with_handler(text("x"))]);
    let events = log.of_type(&event::REGISTER_URL);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "Registering URL: /r/:id PUT");
    assert_eq!(events[0].data_str("path"), Some("/r/:id"));
    assert_eq!(events[0].data_str("method"), Some("PUT"));
}

#[test]
fn test_not_found_and_405_emit_events() {
    let log = EventLog::new();
    let d = Dispatcher::builder().event_emitter(log.emitter()).build();
    d.register([Endpoint::new("/a", "GET").with_handler(text("a"))]);
    dispatch(&d, request("GET", "/nope"));
    dispatch(&d, request("PATCH", "/a"));
    assert_eq!(log.count(&event::NOT_FOUND), 1);
    let mna = log.of_type(&event::METHOD_NOT_ALLOWED);
    assert_eq!(mna.len(), 1);
    assert_eq!(mna[0].data_str("allow"), Some("OPTIONS, GET, HEAD"));
}

#[test]
fn test_custom_not_found() {
    let d = Dispatcher::builder()
        .not_found(handler_fn(|w, _req| {
            w.write_header(StatusCode::IM_A_TEAPOT);
            w.write(b"custom").unwrap();
        }))
        .build();
    let rec = dispatch(&d, request("GET", "/anything"));
    assert_eq!(rec.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(rec.body_string(), "custom");
}

#[test]
fn test_unregister_reverts_route_and_allow() {
    let d = get_post_dispatcher();
    d.unregister("POST", "/a");
    assert_eq!(dispatch(&d, request("POST", "/a")).status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(d.allowed_methods("/a"), vec![Method::OPTIONS, Method::GET, Method::HEAD]);
    d.unregister("GET", "/a");
    assert_eq!(dispatch(&d, request("GET", "/a")).status(), StatusCode::NOT_FOUND);
    // Unknown routes and bad methods are ignored.
    d.unregister("GET", "/never");
    d.unregister("", "/a");
}

/// Router without the `MethodsFor` capability.
struct PlainRouter(BuiltinRouter);

impl Router for PlainRouter {
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: SharedHandler,
    ) -> Result<(), RouteError> {
        self.0.register(method, pattern, handler)
    }

    fn unregister(&mut self, method: &Method, pattern: &str) {
        self.0.unregister(method, pattern);
    }

    fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.0.match_route(method, path)
    }
}

#[test]
fn test_custom_router_falls_back_to_index() {
    let d = Dispatcher::builder()
        .router(Box::new(PlainRouter(BuiltinRouter::new())))
        .build();
    d.register([
        Endpoint::new("/c/{id}", "GET").with_handler(text("g")),
        Endpoint::new("/c/:id", "DELETE").with_handler(text("d")),
    ]);

    let rec = dispatch(&d, request("OPTIONS", "/c/5"));
    assert_eq!(rec.status(), StatusCode::NO_CONTENT);
    assert_eq!(rec.header("allow"), Some("OPTIONS, GET, HEAD, DELETE"));

    let rec = dispatch(&d, request("PUT", "/c/5"));
    assert_eq!(rec.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(d.is_method_not_allowed(&Method::PUT, "/c/5"));
    assert!(!d.is_method_not_allowed(&Method::GET, "/c/5"));
    assert!(!d.is_method_not_allowed(&Method::PUT, "/c/"));
}

#[test]
fn test_handler_can_register_routes_while_running() {
    let d = Arc::new(Dispatcher::new());
    let inner = Arc::clone(&d);
    d.register([Endpoint::new("/install", "POST").with_handler(handler_fn(
        move |w, _req: Request| {
            inner.register([Endpoint::new("/installed", "GET").with_handler(text("here"))]);
            w.write_header(StatusCode::CREATED);
        },
    ))]);
    assert_eq!(dispatch(&d, request("POST", "/install")).status(), StatusCode::CREATED);
    assert_eq!(dispatch(&d, request("GET", "/installed")).body_string(), "here");
}

#[test]
fn test_dispatcher_can_be_mounted_as_handler() {
    let inner = Arc::new(get_post_dispatcher());
    let outer = Dispatcher::new();
    outer.register([Endpoint::new("/a", "GET").with_handler(inner)]);
    assert_eq!(dispatch(&outer, request("GET", "/a")).body_string(), "get");
}

#[test]
fn test_concurrent_dispatch() {
    let d = Arc::new(get_post_dispatcher());
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let d = Arc::clone(&d);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(dispatch(&d, request("GET", "/a")).body_string(), "get");
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
}
