use http::Method;
use std::collections::HashSet;

const PREFERRED: [Method; 7] = [
    Method::OPTIONS,
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Order a set of registered methods for an `Allow` header.
///
/// GET implies HEAD, and a non-empty set implies OPTIONS. Known methods come
/// first in a fixed order; custom methods follow, sorted.
///
/// ```rust
/// use brrtdispatch::router::stable_allow;
/// use http::Method;
///
/// let allowed = stable_allow([Method::POST, Method::GET].into_iter().collect());
/// assert_eq!(allowed, vec![Method::OPTIONS, Method::GET, Method::HEAD, Method::POST]);
/// ```
#[must_use]
pub fn stable_allow(mut set: HashSet<Method>) -> Vec<Method> {
    if set.is_empty() {
        return Vec::new();
    }
    if set.contains(&Method::GET) {
        set.insert(Method::HEAD);
    }
    set.insert(Method::OPTIONS);

    let mut out = Vec::with_capacity(set.len());
    for m in PREFERRED {
        if set.remove(&m) {
            out.push(m);
        }
    }
    let mut rest: Vec<Method> = set.into_iter().collect();
    rest.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    out.extend(rest);
    out
}

/// Render methods as an `Allow` header value.
#[must_use]
pub fn allow_header(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
