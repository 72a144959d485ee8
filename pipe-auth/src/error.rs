//! Error types for the `pipe-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for pipe-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in pipe-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    State(StateErrorKind),
    Strategy(StrategyErrorKind),
    Http(HttpErrorKind),
}

/// Errors from state token encoding and validation.
#[derive(Debug, PartialEq)]
pub enum StateErrorKind {
    InvalidEncoding,
    MalformedToken,
    UnsupportedVersion,
    MissingPipeId,
}

/// Errors from auth strategy operations.
#[derive(Debug, PartialEq)]
pub enum StrategyErrorKind {
    /// No strategy registered for the requested pipe id.
    NotRegistered,
    /// The provider reported an authentication failure with an HTTP status.
    Upstream { status: u16 },
    /// The provider returned a response we could not interpret.
    InvalidResponse,
    Network,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::State(kind) => write!(f, "State token error: {:?}", kind),
            ErrorKind::Strategy(kind) => write!(f, "Auth strategy error: {:?}", kind),
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create state token errors.
pub fn state_error(kind: StateErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::State(kind),
    }
}

/// Helper function to create auth strategy errors.
pub fn strategy_error(kind: StrategyErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Strategy(kind),
    }
}

impl Error {
    /// HTTP status reported by the upstream provider, if this error carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self.error_kind {
            ErrorKind::Strategy(StrategyErrorKind::Upstream { status }) => Some(status),
            _ => None,
        }
    }
}
