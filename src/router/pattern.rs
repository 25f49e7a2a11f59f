//! Route pattern compilation.
//!
//! A pattern such as `/users/:id/posts/{post}` compiles into an ordered list
//! of [`Segment`]s. Colon and brace parameter syntax are interchangeable and
//! may be mixed within one pattern.

use super::core::Params;
use super::error::RouteError;
use std::sync::Arc;

/// One path segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Binds any non-empty request segment under this name.
    Param(Arc<str>),
}

/// A route pattern split into segments, ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    raw: String,
    segments: Vec<Segment>,
}

/// Split a path into segments after stripping one leading and one trailing `/`.
///
/// The root path (and the empty string) yields a single empty segment.
///
/// ```rust
/// use brrtdispatch::router::split_path;
///
/// assert_eq!(split_path("/"), vec![""]);
/// assert_eq!(split_path("/a/b/"), vec!["a", "b"]);
/// assert_eq!(split_path("/a//b"), vec!["a", "", "b"]);
/// ```
#[must_use]
pub fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.split('/').collect()
}

/// Parameter name for a `:name` or `{name}` segment.
///
/// Segments that are not well-formed (`{}`, `{id`, `id}`, a bare `:`) are
/// literals and return `None`.
#[must_use]
pub fn param_name(segment: &str) -> Option<&str> {
    if let Some(name) = segment.strip_prefix(':') {
        return (!name.is_empty()).then_some(name);
    }
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

impl CompiledPattern {
    /// Compile a route pattern.
    ///
    /// # Errors
    ///
    /// [`RouteError::DuplicateParam`] if a parameter name occurs twice.
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let mut segments = Vec::new();
        for part in split_path(pattern) {
            match param_name(part) {
                Some(name) => {
                    let dup = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(n) if n.as_ref() == name));
                    if dup {
                        return Err(RouteError::DuplicateParam {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(Arc::from(name)));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }
        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern string as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern has no parameter segments.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Match a concrete path, returning the bound parameters on success.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let parts = split_path(path);
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => params.push(Arc::clone(name), part.to_string()),
            }
        }
        Some(params)
    }

    /// Like [`match_path`](Self::match_path) without collecting parameters.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let parts = split_path(path);
        parts.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(parts)
                .all(|(segment, part)| match segment {
                    Segment::Literal(lit) => lit == part,
                    Segment::Param(_) => !part.is_empty(),
                })
    }

    /// True if both patterns match exactly the same set of paths, i.e. they
    /// only differ in parameter names.
    #[must_use]
    pub fn same_shape(&self, other: &CompiledPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }
}
