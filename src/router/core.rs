//! Router core: the [`Router`] trait and the built-in route table.
//!
//! This is on the request hot path. Matching allocates only for the bound
//! parameter values.

use super::error::RouteError;
use super::methods::stable_allow;
use super::pattern::CompiledPattern;
use crate::handler::{Request, SharedHandler};
use http::Method;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum number of path parameters before the param vector spills to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Names are `Arc<str>` shared with the compiled pattern; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Path parameters bound by a parameterized match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(ParamVec);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub(crate) fn push(&mut self, name: Arc<str>, value: String) {
        self.0.push((name, value));
    }

    /// Value bound to `name`.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy into an owned map. Allocates; prefer [`get`](Self::get) in handlers.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Result of a successful route lookup.
#[derive(Clone)]
pub struct RouteMatch {
    pub handler: SharedHandler,
    /// Empty for exact matches.
    pub params: Params,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Optional introspection capability: which methods are registered for a path.
pub trait MethodsFor {
    /// Allowed methods for a concrete path in `Allow` header order.
    ///
    /// GET implies HEAD and any non-empty set implies OPTIONS. An unknown path
    /// yields an empty vector.
    fn methods_for(&self, path: &str) -> Vec<Method>;
}

/// Pluggable routing surface used by the dispatcher.
///
/// Implementations are not required to synchronize writers; mutation takes
/// `&mut self` and callers serialize it.
pub trait Router: Send + Sync {
    /// Register `handler` for `method` and `pattern`.
    ///
    /// An empty pattern is ignored.
    ///
    /// # Errors
    ///
    /// [`RouteError`] if the pattern cannot be compiled.
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: SharedHandler,
    ) -> Result<(), RouteError>;

    /// Remove a registration. Unknown routes are ignored.
    fn unregister(&mut self, method: &Method, pattern: &str);

    /// Look up the handler for `method` and `path`.
    fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch>;

    fn match_request(&self, req: &Request) -> Option<RouteMatch> {
        self.match_route(req.method(), req.uri().path())
    }

    /// Capability probe for [`MethodsFor`].
    fn as_methods_for(&self) -> Option<&dyn MethodsFor> {
        None
    }
}

struct RouteEntry {
    pattern: CompiledPattern,
    handler: SharedHandler,
}

/// Default router: exact lookup table plus ordered parameterized entries.
///
/// Exact routes are checked first; parameterized routes are tried in
/// registration order and the first full match wins.
#[derive(Default)]
pub struct BuiltinRouter {
    exact: HashMap<Method, HashMap<String, SharedHandler>>,
    param: HashMap<Method, Vec<RouteEntry>>,
}

impl BuiltinRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of registrations across all methods.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.exact.values().map(HashMap::len).sum::<usize>()
            + self.param.values().map(Vec::len).sum::<usize>()
    }
}

impl Router for BuiltinRouter {
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: SharedHandler,
    ) -> Result<(), RouteError> {
        if pattern.is_empty() {
            return Ok(());
        }
        let compiled = CompiledPattern::compile(pattern)?;

        if compiled.is_exact() {
            info!(method = %method, pattern = %pattern, kind = "exact", "Route registered");
            self.exact
                .entry(method)
                .or_default()
                .insert(pattern.to_string(), handler);
            return Ok(());
        }

        let entries = self.param.entry(method.clone()).or_default();
        if let Some(existing) = entries.iter_mut().find(|e| e.pattern.as_str() == pattern) {
            info!(method = %method, pattern = %pattern, "Route handler replaced");
            existing.handler = handler;
            return Ok(());
        }
        if let Some(shadowing) = entries.iter().find(|e| e.pattern.same_shape(&compiled)) {
            debug!(
                method = %method,
                pattern = %pattern,
                existing = %shadowing.pattern.as_str(),
                "Pattern overlaps an earlier registration; the earlier one wins"
            );
        }
        info!(method = %method, pattern = %pattern, kind = "param", "Route registered");
        entries.push(RouteEntry {
            pattern: compiled,
            handler,
        });
        Ok(())
    }

    fn unregister(&mut self, method: &Method, pattern: &str) {
        if let Some(table) = self.exact.get_mut(method) {
            table.remove(pattern);
            if table.is_empty() {
                self.exact.remove(method);
            }
        }
        if let Some(entries) = self.param.get_mut(method) {
            if let Some(pos) = entries.iter().position(|e| e.pattern.as_str() == pattern) {
                entries.remove(pos);
            }
            if entries.is_empty() {
                self.param.remove(method);
            }
        }
    }

    fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        if let Some(handler) = self.exact.get(method).and_then(|t| t.get(path)) {
            debug!(method = %method, path = %path, kind = "exact", "Route matched");
            return Some(RouteMatch {
                handler: Arc::clone(handler),
                params: Params::new(),
            });
        }
        let entries = self.param.get(method)?;
        for entry in entries {
            if let Some(params) = entry.pattern.match_path(path) {
                debug!(
                    method = %method,
                    path = %path,
                    pattern = %entry.pattern.as_str(),
                    params = params.len(),
                    "Route matched"
                );
                return Some(RouteMatch {
                    handler: Arc::clone(&entry.handler),
                    params,
                });
            }
        }
        debug!(method = %method, path = %path, "No route matched");
        None
    }

    fn as_methods_for(&self) -> Option<&dyn MethodsFor> {
        Some(self)
    }
}

impl MethodsFor for BuiltinRouter {
    fn methods_for(&self, path: &str) -> Vec<Method> {
        let mut set: HashSet<Method> = HashSet::new();
        for (method, table) in &self.exact {
            if table.contains_key(path) {
                set.insert(method.clone());
            }
        }
        for (method, entries) in &self.param {
            if entries.iter().any(|e| e.pattern.matches(path)) {
                set.insert(method.clone());
            }
        }
        stable_allow(set)
    }
}
