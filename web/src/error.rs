use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;

use domain::error::{
    AuthErrorKind, DomainErrorKind, Error as DomainError, FlowErrorKind, InternalErrorKind,
};

extern crate log;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(pub(crate) DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// Authentication-class failures go back to the browser as HTML 401 pages;
// configuration/lookup-class failures are JSON error payloads.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let message = self
            .0
            .source
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        match self.0.error_kind {
            DomainErrorKind::Auth(auth_error_kind) => match auth_error_kind {
                AuthErrorKind::Failed { status } => unauthorized_page(&format!(
                    "Authentication failed (upstream status {status})."
                )),
                AuthErrorKind::UnknownUser => {
                    unauthorized_page("User not known to data source.")
                }
                AuthErrorKind::PostProcessing {
                    connector_id,
                    pipe_id,
                } => unauthorized_page(&format!(
                    "Connector [{connector_id}] rejected the authenticated user for pipe [{pipe_id}]: {message}"
                )),
                AuthErrorKind::ConnectorFault {
                    connector_id,
                    pipe_id,
                } => unauthorized_page(&format!(
                    "Connector [{connector_id}] failed while completing setup of pipe [{pipe_id}]: {message}"
                )),
            },
            DomainErrorKind::Flow(flow_error_kind) => {
                let status = match flow_error_kind {
                    FlowErrorKind::MissingPipeId => StatusCode::BAD_REQUEST,
                    FlowErrorKind::ConnectorNotFound => StatusCode::NOT_FOUND,
                    FlowErrorKind::PipeLookup => StatusCode::INTERNAL_SERVER_ERROR,
                    FlowErrorKind::EmptyConnectorResult => StatusCode::BAD_GATEWAY,
                };
                (status, axum::Json(json!({ "error": message }))).into_response()
            }
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Other(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({ "error": message })),
                )
                    .into_response(),
            },
        }
    }
}

fn unauthorized_page(detail: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Html(format!(
            "<html><body><h1>401 Unauthorized</h1><p>{detail}</p></body></html>"
        )),
    )
        .into_response()
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
