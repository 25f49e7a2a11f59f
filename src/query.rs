//! Query-string decoding.
//!
//! The dispatcher decodes the query of every matched request through a
//! [`QueryDecoder`] and attaches the resulting [`QueryMap`] to the request.
//! Handlers read it with [`crate::dispatcher::query_map`].

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A decoded query value: a single string, or every value of a repeated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// First value for the key.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(v) => Some(v),
            QueryValue::Multi(vs) => vs.first().map(String::as_str),
        }
    }

    /// All values in query order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(v) => vec![v.as_str()],
            QueryValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Multi(vec![first, value]);
            }
            QueryValue::Multi(vs) => vs.push(value),
        }
    }
}

/// Decoded query parameters, one entry per distinct key.
pub type QueryMap = HashMap<String, QueryValue>;

/// Decoder failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDecodeError {
    pub message: String,
}

impl QueryDecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for QueryDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query decode failed: {}", self.message)
    }
}

impl std::error::Error for QueryDecodeError {}

/// Turns a raw query string (without the leading `?`) into a [`QueryMap`].
pub trait QueryDecoder: Send + Sync {
    /// # Errors
    ///
    /// Implementations may reject queries they cannot represent.
    fn decode(&self, query: &str) -> Result<QueryMap, QueryDecodeError>;
}

/// Flat decoder: `?x=1&y=a&y=b` becomes `{x: "1", y: ["a", "b"]}`.
///
/// Percent-escapes and `+` are decoded as in `application/x-www-form-urlencoded`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainDecoder;

impl QueryDecoder for PlainDecoder {
    fn decode(&self, query: &str) -> Result<QueryMap, QueryDecodeError> {
        let mut out = QueryMap::new();
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            match out.get_mut(k.as_ref()) {
                Some(existing) => existing.push(v.into_owned()),
                None => {
                    out.insert(k.into_owned(), QueryValue::Single(v.into_owned()));
                }
            }
        }
        Ok(out)
    }
}
