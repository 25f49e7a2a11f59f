use crate::router::stable_allow;
use http::Method;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

/// Pattern to method-set index kept by the dispatcher.
///
/// Used for allowed-method derivation when the router has no
/// [`crate::router::MethodsFor`] capability. Matching is implemented here so the
/// index does not depend on any router implementation.
#[derive(Debug, Default)]
pub struct RouteIndex {
    routes: RwLock<HashMap<String, HashSet<Method>>>,
}

impl RouteIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, pattern: &str, method: Method) {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(pattern.to_string())
            .or_default()
            .insert(method);
    }

    /// Drop one method; the pattern goes once no method remains.
    pub fn remove(&self, pattern: &str, method: &Method) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(methods) = routes.get_mut(pattern) {
            methods.remove(method);
            if methods.is_empty() {
                routes.remove(pattern);
            }
        }
    }

    /// Allowed methods for a concrete path, in `Allow` header order.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        let mut set = HashSet::new();
        for (pattern, methods) in routes.iter() {
            if pattern == path || matches_pattern(pattern, path) {
                set.extend(methods.iter().cloned());
            }
        }
        stable_allow(set)
    }
}

fn segments(p: &str) -> impl Iterator<Item = &str> {
    let p = p.strip_prefix('/').unwrap_or(p);
    p.strip_suffix('/').unwrap_or(p).split('/')
}

fn is_param(seg: &str) -> bool {
    (seg.len() > 1 && seg.starts_with(':'))
        || (seg.len() > 2 && seg.starts_with('{') && seg.ends_with('}'))
}

fn matches_pattern(pattern: &str, path: &str) -> bool {
    let mut pat = segments(pattern);
    let mut concrete = segments(path);
    loop {
        match (pat.next(), concrete.next()) {
            (None, None) => return true,
            (Some(p), Some(c)) => {
                let ok = if is_param(p) { !c.is_empty() } else { p == c };
                if !ok {
                    return false;
                }
            }
            _ => return false,
        }
    }
}
