//! This module re-exports various items from the `connector_api` and
//! `pipe-auth` crates.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the lower layers. By re-exporting these items, we provide a clear and
//! consistent interface for working with pipes, connectors and auth strategies within the domain
//! layer, while the underlying implementation details remain in their own crates.
pub use connector_api::{
    error::Error as ConnectorApiError, Connector, ConnectorRegistry, Id, InMemoryPipeStore, Pipe,
    PipeStore,
};

pub use pipe_auth::{
    error::{strategy_error, StrategyErrorKind},
    strategy::oauth2::{EndpointUrls, OAuth2Strategy},
    AuthOutcome, AuthStrategy, AuthUser, CallbackRequest, Error as PipeAuthError, StateToken,
    StrategyRegistry,
};

pub mod error;
pub mod oauth_flow;
