use std::fmt;

/// Registration failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The same parameter name appears twice in one pattern.
    DuplicateParam { pattern: String, name: String },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::DuplicateParam { pattern, name } => {
                write!(f, "duplicate path parameter '{name}' in pattern '{pattern}'")
            }
        }
    }
}

impl std::error::Error for RouteError {}
