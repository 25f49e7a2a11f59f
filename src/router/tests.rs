#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{
    allow_header, param_name, split_path, BuiltinRouter, CompiledPattern, MethodsFor, RouteError,
    Router, Segment,
};
use crate::handler::{handler_fn, SharedHandler};
use crate::response::{BufferedResponse, ResponseWriter};
use http::{Method, StatusCode};

fn tagged(tag: &'static str) -> SharedHandler {
    handler_fn(move |w, _req| {
        let _ = w.write(tag.as_bytes());
    })
}

fn run(router: &BuiltinRouter, method: Method, path: &str) -> Option<String> {
    let m = router.match_route(&method, path)?;
    let mut rec = BufferedResponse::new();
    let req = http::Request::builder()
        .method(method)
        .uri(path)
        .body(crate::handler::Body::empty())
        .unwrap();
    m.handler.serve(&mut rec, req);
    Some(rec.body_string())
}

#[test]
fn test_root_path() {
    assert_eq!(split_path("/"), vec![""]);
    assert_eq!(split_path(""), vec![""]);
    let p = CompiledPattern::compile("/").unwrap();
    assert!(p.is_exact());
    assert_eq!(p.segments(), &[Segment::Literal(String::new())]);
    assert!(p.matches("/"));
}

#[test]
fn test_split_strips_single_slash() {
    assert_eq!(split_path("/a/b"), vec!["a", "b"]);
    assert_eq!(split_path("a/b/"), vec!["a", "b"]);
    assert_eq!(split_path("/a/b//"), vec!["a", "b", ""]);
}

#[test]
fn test_param_name_syntax() {
    assert_eq!(param_name(":id"), Some("id"));
    assert_eq!(param_name("{id}"), Some("id"));
    assert_eq!(param_name("{}"), None);
    assert_eq!(param_name("{id"), None);
    assert_eq!(param_name("id}"), None);
    assert_eq!(param_name(":"), None);
    assert_eq!(param_name("users"), None);
}

#[test]
fn test_malformed_brace_is_literal() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "/a/{}", tagged("lit")).unwrap();
    assert_eq!(run(&r, Method::GET, "/a/{}").as_deref(), Some("lit"));
    assert!(r.match_route(&Method::GET, "/a/x").is_none());
}

#[test]
fn test_mixed_param_syntax() {
    let p = CompiledPattern::compile("/org/:org/team/{team}").unwrap();
    let params = p.match_path("/org/acme/team/core").unwrap();
    assert_eq!(params.get("org"), Some("acme"));
    assert_eq!(params.get("team"), Some("core"));
    let names: Vec<_> = params.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["org", "team"]);
}

#[test]
fn test_duplicate_param_rejected() {
    let err = CompiledPattern::compile("/a/:id/b/{id}").unwrap_err();
    assert_eq!(
        err,
        RouteError::DuplicateParam {
            pattern: "/a/:id/b/{id}".into(),
            name: "id".into()
        }
    );
    let mut r = BuiltinRouter::new();
    assert!(r.register(Method::GET, "/a/:id/:id", tagged("x")).is_err());
    assert_eq!(r.route_count(), 0);
}

#[test]
fn test_empty_pattern_is_noop() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "", tagged("x")).unwrap();
    assert_eq!(r.route_count(), 0);
}

#[test]
fn test_exact_checked_before_param() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "/users/:id", tagged("param")).unwrap();
    r.register(Method::GET, "/users/me", tagged("exact")).unwrap();
    assert_eq!(run(&r, Method::GET, "/users/me").as_deref(), Some("exact"));
    assert_eq!(run(&r, Method::GET, "/users/7").as_deref(), Some("param"));
    let m = r.match_route(&Method::GET, "/users/me").unwrap();
    assert!(m.params.is_empty());
}

#[test]
fn test_first_registered_param_wins() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "/a/:x", tagged("first")).unwrap();
    r.register(Method::GET, "/a/:y", tagged("second")).unwrap();
    assert_eq!(run(&r, Method::GET, "/a/1").as_deref(), Some("first"));
    let m = r.match_route(&Method::GET, "/a/1").unwrap();
    assert_eq!(m.params.get("x"), Some("1"));
}

#[test]
fn test_reregister_param_replaces_in_place() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "/a/:x", tagged("one")).unwrap();
    r.register(Method::GET, "/a/:y", tagged("two")).unwrap();
    r.register(Method::GET, "/a/:x", tagged("three")).unwrap();
    assert_eq!(r.route_count(), 2);
    assert_eq!(run(&r, Method::GET, "/a/1").as_deref(), Some("three"));
}

#[test]
fn test_reregister_exact_overwrites() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "/x", tagged("old")).unwrap();
    r.register(Method::GET, "/x", tagged("new")).unwrap();
    assert_eq!(r.route_count(), 1);
    assert_eq!(run(&r, Method::GET, "/x").as_deref(), Some("new"));
}

#[test]
fn test_param_requires_non_empty_segment() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "/user/:id", tagged("u")).unwrap();
    assert!(r.match_route(&Method::GET, "/user/").is_none());
    assert!(r.match_route(&Method::GET, "/user").is_none());
    assert!(r.match_route(&Method::GET, "/user//").is_none());
    assert!(r.match_route(&Method::GET, "/user/5").is_some());
}

#[test]
fn test_method_is_part_of_key() {
    let mut r = BuiltinRouter::new();
    r.register(Method::POST, "/items", tagged("post")).unwrap();
    assert!(r.match_route(&Method::GET, "/items").is_none());
    assert_eq!(run(&r, Method::POST, "/items").as_deref(), Some("post"));
}

#[test]
fn test_unregister_absent_is_noop() {
    let mut r = BuiltinRouter::new();
    r.unregister(&Method::GET, "/never");
    r.register(Method::GET, "/a/:id", tagged("a")).unwrap();
    r.unregister(&Method::DELETE, "/a/:id");
    r.unregister(&Method::GET, "/a/:other");
    assert_eq!(r.route_count(), 1);
}

#[test]
fn test_unregister_removes_routes() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "/a", tagged("a")).unwrap();
    r.register(Method::GET, "/a/:id", tagged("b")).unwrap();
    r.unregister(&Method::GET, "/a");
    r.unregister(&Method::GET, "/a/:id");
    assert!(r.match_route(&Method::GET, "/a").is_none());
    assert!(r.match_route(&Method::GET, "/a/1").is_none());
    assert!(r.methods_for("/a").is_empty());
}

#[test]
fn test_methods_for_order_is_stable() {
    for order in [[Method::GET, Method::POST], [Method::POST, Method::GET]] {
        let mut r = BuiltinRouter::new();
        for m in order {
            r.register(m, "/x", tagged("x")).unwrap();
        }
        assert_eq!(
            r.methods_for("/x"),
            vec![Method::OPTIONS, Method::GET, Method::HEAD, Method::POST]
        );
    }
}

#[test]
fn test_methods_for_custom_methods_sorted_last() {
    let mut r = BuiltinRouter::new();
    let purge = Method::from_bytes(b"PURGE").unwrap();
    let lock = Method::from_bytes(b"LOCK").unwrap();
    r.register(purge, "/c/:id", tagged("p")).unwrap();
    r.register(lock, "/c/:id", tagged("l")).unwrap();
    r.register(Method::DELETE, "/c/{id}", tagged("d")).unwrap();
    let allowed = r.methods_for("/c/1");
    assert_eq!(allow_header(&allowed), "OPTIONS, DELETE, LOCK, PURGE");
}

#[test]
fn test_methods_for_unknown_path_is_empty() {
    let mut r = BuiltinRouter::new();
    r.register(Method::GET, "/x", tagged("x")).unwrap();
    assert!(r.methods_for("/y").is_empty());
}

#[test]
fn test_builtin_exposes_methods_for() {
    let r = BuiltinRouter::new();
    assert!(r.as_methods_for().is_some());
}

#[test]
fn test_same_shape() {
    let a = CompiledPattern::compile("/a/:x/b").unwrap();
    let b = CompiledPattern::compile("/a/{y}/b").unwrap();
    let c = CompiledPattern::compile("/a/:x/c").unwrap();
    assert!(a.same_shape(&b));
    assert!(!a.same_shape(&c));
}

#[test]
fn test_handler_writes_through_match() {
    let mut r = BuiltinRouter::new();
    r.register(
        Method::GET,
        "/s",
        handler_fn(|w, _req| w.write_header(StatusCode::ACCEPTED)),
    )
    .unwrap();
    let m = r.match_route(&Method::GET, "/s").unwrap();
    let mut rec = BufferedResponse::new();
    let req = http::Request::builder()
        .uri("/s")
        .body(crate::handler::Body::empty())
        .unwrap();
    m.handler.serve(&mut rec, req);
    assert_eq!(rec.status(), StatusCode::ACCEPTED);
}
