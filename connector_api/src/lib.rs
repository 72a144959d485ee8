//! Connector plugin surface for the Pipeflow platform.
//!
//! A connector is a data-source plugin: it supplies source-specific OAuth
//! authorization parameters and a post-processing hook that runs after a
//! provider callback has been authenticated. Connectors are registered by
//! the platform's plugin loader; this crate only defines the contract and
//! the registry the orchestrator reads from.

pub mod connector;
pub mod error;
pub mod pipe;
pub mod registry;
pub mod store;

pub use connector::Connector;
pub use pipe::{Id, Pipe};
pub use registry::ConnectorRegistry;
pub use store::{InMemoryPipeStore, PipeStore};
