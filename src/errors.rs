use std::{fmt, panic::Location};

use axum::http::StatusCode;
use thiserror::Error;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;

/// Source position an internal failure was raised or a panic occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl From<&Location<'_>> for FaultLocation {
    fn from(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for FaultLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Protocol-level failure raised while validating or dispatching a request.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    MethodNotFound(String),
    #[error("{message}")]
    Internal {
        message: String,
        location: FaultLocation,
    },
    /// A panic caught at the dispatch boundary; already logged at the panic site.
    #[error("{message}")]
    Fault {
        message: String,
        location: Option<FaultLocation>,
    },
}

impl ProtocolError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::MethodNotFound(message.into())
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            location: Location::caller().into(),
        }
    }

    pub fn fault(message: impl Into<String>, location: Option<FaultLocation>) -> Self {
        Self::Fault {
            message: message.into(),
            location,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => PARSE_ERROR,
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::Internal { .. } | Self::Fault { .. } => INTERNAL_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Parse(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } | Self::Fault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure reported by a tool while executing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ToolError {
    pub message: String,
}

impl ToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool name '{0}' must match [A-Za-z0-9_.-] and be at most 64 characters")]
    InvalidToolName(String),
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_codes_and_statuses() {
        let cases = [
            (ProtocolError::parse("p"), -32700, 400),
            (ProtocolError::invalid_request("i"), -32600, 400),
            (ProtocolError::method_not_found("m"), -32601, 404),
            (ProtocolError::internal("x"), -32603, 500),
            (ProtocolError::fault("f", None), -32603, 500),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status().as_u16(), status);
        }
    }

    #[test]
    fn internal_error_records_caller_location() {
        let error = ProtocolError::internal("boom");
        let ProtocolError::Internal { location, .. } = error else {
            panic!("expected internal error");
        };
        assert!(location.file.ends_with("errors.rs"));
        assert!(location.to_string().starts_with(&location.file));
    }
}
