use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// Event category such as `event_panic`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An endpoint was registered.
pub const REGISTER_URL: EventType = EventType::from_static("event_register_url");
/// No route (and no other method) for the path.
pub const NOT_FOUND: EventType = EventType::from_static("event_not_found");
/// The path exists for other methods.
pub const METHOD_NOT_ALLOWED: EventType = EventType::from_static("event_method_not_allowed");
/// A handler panicked and was recovered.
pub const PANIC: EventType = EventType::from_static("event_panic");
/// The request body exceeded the configured limit.
pub const BODY_TOO_LARGE: EventType = EventType::from_static("event_body_too_large");
/// Writing the response to the client failed.
pub const OUTPUT_ERROR: EventType = EventType::from_static("event_output_error");
pub const QUERY_DECODE_ERROR: EventType = EventType::from_static("event_query_decode_error");
/// Endpoint registration was rejected.
pub const REGISTER_ERROR: EventType = EventType::from_static("event_register_error");
pub const SERVER_START: EventType = EventType::from_static("event_start");
pub const SERVER_STOP: EventType = EventType::from_static("event_shutdown");

/// Event severity, mapped onto tracing levels by [`super::TracingEmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// A structured notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_type: EventType,
    pub message: String,
    pub severity: Severity,
    pub data: Map<String, Value>,
}

impl Event {
    pub fn new(event_type: EventType, message: impl Into<String>) -> Self {
        Self {
            event_type,
            message: message.into(),
            severity: Severity::default(),
            data: Map::new(),
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach one data field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Attach the request id when one is known.
    #[must_use]
    pub fn with_request_id(self, id: Option<&crate::ids::RequestId>) -> Self {
        match id {
            Some(id) => self.with("request_id", id.as_str()),
            None => self,
        }
    }

    /// String data field, if present.
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}
