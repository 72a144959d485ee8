//! Error types for the `domain` layer.
use connector_api::error::{ConnectorApiErrorKind, Error as ConnectorApiError};
use pipe_auth::error::{
    Error as PipeAuthError, ErrorKind as PipeAuthErrorKind, StrategyErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries. Ex. `domain` is dependent on `connector_api` and `pipe-auth`, and
/// `web` is dependent on `domain`, but `web` should not be dependent, directly, on the
/// lower layers. Ultimately the various `error_kind`s are used by `web` to choose
/// between JSON error payloads and HTML 401 pages.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    /// Authentication-class failures, surfaced to the browser as HTML 401 pages.
    Auth(AuthErrorKind),
    /// Configuration/lookup-class failures, surfaced as JSON error payloads.
    Flow(FlowErrorKind),
    Internal(InternalErrorKind),
}

/// Authentication-class failures for a single callback.
#[derive(Debug, PartialEq)]
pub enum AuthErrorKind {
    /// The auth middleware reported a failure; carries the upstream status.
    Failed { status: u16 },
    /// The middleware succeeded but the provider account is not known to
    /// the data source.
    UnknownUser,
    /// The connector's post-processing hook reported a failure.
    PostProcessing {
        connector_id: String,
        pipe_id: String,
    },
    /// The connector's post-processing hook panicked; the fault was caught
    /// at the boundary and converted.
    ConnectorFault {
        connector_id: String,
        pipe_id: String,
    },
}

/// Configuration/lookup-class failures in the orchestration flow.
#[derive(Debug, PartialEq)]
pub enum FlowErrorKind {
    /// No pipe id could be recovered from the query state or the session.
    MissingPipeId,
    /// No connector (or auth strategy) registered for the pipe.
    ConnectorNotFound,
    /// The pipe configuration could not be retrieved.
    PipeLookup,
    /// Post-processing produced neither an error nor a pipe.
    EmptyConnectorResult,
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `connector_api` layer to the `domain` layer.
impl From<ConnectorApiError> for Error {
    fn from(err: ConnectorApiError) -> Self {
        let error_kind = match err.error_kind {
            ConnectorApiErrorKind::PipeNotFound | ConnectorApiErrorKind::Store => {
                DomainErrorKind::Flow(FlowErrorKind::PipeLookup)
            }
            ConnectorApiErrorKind::ConnectorNotFound => {
                DomainErrorKind::Flow(FlowErrorKind::ConnectorNotFound)
            }
            ConnectorApiErrorKind::Invalid => DomainErrorKind::Flow(FlowErrorKind::MissingPipeId),
            ConnectorApiErrorKind::PostProcessing => {
                DomainErrorKind::Auth(AuthErrorKind::PostProcessing {
                    connector_id: String::new(),
                    pipe_id: String::new(),
                })
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

// This is where we translate errors from the `pipe-auth` layer to the `domain` layer.
impl From<PipeAuthError> for Error {
    fn from(err: PipeAuthError) -> Self {
        let error_kind = match &err.error_kind {
            // A state token we cannot decode means no pipe id can be recovered.
            PipeAuthErrorKind::State(_) => DomainErrorKind::Flow(FlowErrorKind::MissingPipeId),
            PipeAuthErrorKind::Strategy(StrategyErrorKind::NotRegistered) => {
                DomainErrorKind::Flow(FlowErrorKind::ConnectorNotFound)
            }
            PipeAuthErrorKind::Strategy(StrategyErrorKind::Upstream { status }) => {
                DomainErrorKind::Auth(AuthErrorKind::Failed { status: *status })
            }
            PipeAuthErrorKind::Strategy(_) | PipeAuthErrorKind::Http(_) => {
                DomainErrorKind::Auth(AuthErrorKind::Failed { status: 502 })
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipe_auth::error::{state_error, strategy_error, StateErrorKind};

    #[test]
    fn test_state_errors_become_missing_pipe_id() {
        let err: Error =
            state_error(StateErrorKind::MalformedToken, "not a token").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Flow(FlowErrorKind::MissingPipeId)
        );
    }

    #[test]
    fn test_upstream_status_is_preserved() {
        let err: Error =
            strategy_error(StrategyErrorKind::Upstream { status: 403 }, "denied").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Auth(AuthErrorKind::Failed { status: 403 })
        );
    }

    #[test]
    fn test_missing_strategy_becomes_connector_not_found() {
        let err: Error =
            strategy_error(StrategyErrorKind::NotRegistered, "no strategy").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Flow(FlowErrorKind::ConnectorNotFound)
        );
    }
}
