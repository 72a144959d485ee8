//! Error types for the connector API layer.
use std::error::Error as StdError;
use std::fmt;

/// Errors while executing operations against pipes and connectors.
/// The intent is to categorize errors into data lookup failures
/// (ex. a pipe id with no record) and failures raised by connector
/// plugins themselves.
#[derive(Debug)]
pub struct Error {
    // Underlying error emitted by a connector or the pipe store
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    // Enum representing which category of error
    pub error_kind: ConnectorApiErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ConnectorApiErrorKind {
    // No pipe record exists for the given id
    PipeNotFound,
    // No connector registered for the pipe's connector id
    ConnectorNotFound,
    // Connector post-processing reported a failure
    PostProcessing,
    // Pipe store failed to execute the lookup
    Store,
    // Invalid input (ex. an empty pipe id)
    Invalid,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Connector API Error: {:?}", self)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Helper function to create connector API errors from a plain message.
pub fn connector_api_error(kind: ConnectorApiErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: kind,
    }
}
