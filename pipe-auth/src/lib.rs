//! # pipe-auth
//!
//! Authentication middleware layer for the Pipeflow platform:
//! - Typed, versioned state tokens round-tripped through OAuth flows
//! - The `AuthStrategy` trait implemented per data-source provider
//! - A generic OAuth 2.0 authorization-code strategy
//! - A registry mapping pipe ids to their registered strategies
//!
//! ## Architecture
//!
//! This crate provides the authentication foundation the orchestrator in
//! `domain` builds upon: the orchestrator resolves a strategy by pipe id,
//! delegates the provider callback to it, and hands the authenticated user
//! to the pipe's connector for post-processing.

pub mod error;
pub mod state;
pub mod strategy;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
pub use state::StateToken;
pub use strategy::{AuthOutcome, AuthStrategy, AuthUser, CallbackRequest, StrategyRegistry};
