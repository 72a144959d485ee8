//! Auth strategy trait and types.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

pub mod oauth2;
mod registry;

pub use registry::StrategyRegistry;

/// The provider callback request as seen by a strategy: the query
/// parameters the provider redirected back with. Provider-specific auth
/// data (authorization code, error codes) is consumed internally by the
/// strategy.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub query: HashMap<String, String>,
}

impl CallbackRequest {
    pub fn new(query: HashMap<String, String>) -> Self {
        Self { query }
    }

    /// Authorization code, if the provider granted one.
    pub fn code(&self) -> Option<&str> {
        self.query.get("code").map(String::as_str)
    }

    /// Provider error code (ex. `access_denied`), if present.
    pub fn error(&self) -> Option<&str> {
        self.query.get("error").map(String::as_str)
    }

    /// Raw state parameter, if present.
    pub fn state(&self) -> Option<&str> {
        self.query.get("state").map(String::as_str)
    }
}

/// User profile established by a strategy for a single callback.
/// Transient: nothing here is persisted by the auth layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider's unique user identifier.
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Full profile document as returned by the provider.
    pub attributes: Value,
    /// Auxiliary auth data (tokens, scopes) attached after authentication.
    pub info: Option<Value>,
}

impl AuthUser {
    /// Attach auxiliary auth info to the user, if any was produced.
    pub fn attach_info(&mut self, info: Option<Value>) {
        if info.is_some() {
            self.info = info;
        }
    }
}

/// Outcome of delegating a callback to a strategy: the middleware may
/// succeed without establishing a user (the provider account is unknown to
/// the data source), which is distinct from an authentication error.
#[derive(Debug, Clone, Default)]
pub struct AuthOutcome {
    pub user: Option<AuthUser>,
    pub info: Option<Value>,
}

/// A provider-specific authentication strategy.
///
/// Strategies are registered per pipe id and are responsible for the OAuth
/// protocol mechanics: building the authorization redirect and turning a
/// provider callback into an authenticated user.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Build the full authorization URL for a flow.
    ///
    /// `extra_params` are connector-supplied authorization parameters
    /// merged into the request; `state` is the encoded state token.
    fn authorization_url(&self, state: &str, extra_params: &HashMap<String, String>) -> String;

    /// Authenticate a provider callback scoped to `pipe_id`.
    ///
    /// Returns an error for provider-reported failures (carrying the
    /// upstream status where known) and an outcome with `user: None` when
    /// the provider account is not known to the data source.
    async fn authenticate(
        &self,
        request: &CallbackRequest,
        pipe_id: &str,
    ) -> Result<AuthOutcome, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_callback_request_accessors() {
        let mut query = HashMap::new();
        query.insert("code".to_string(), "abc123".to_string());
        query.insert("state".to_string(), "opaque".to_string());
        let request = CallbackRequest::new(query);

        assert_eq!(request.code(), Some("abc123"));
        assert_eq!(request.state(), Some("opaque"));
        assert_eq!(request.error(), None);
    }

    #[test]
    fn test_attach_info_keeps_existing_when_none() {
        let mut user = AuthUser {
            id: "u1".to_string(),
            email: None,
            name: None,
            attributes: Value::Null,
            info: Some(json!({"scope": "read"})),
        };

        user.attach_info(None);
        assert_eq!(user.info, Some(json!({"scope": "read"})));

        user.attach_info(Some(json!({"scope": "write"})));
        assert_eq!(user.info, Some(json!({"scope": "write"})));
    }
}
