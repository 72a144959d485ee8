//! The connector plugin contract.

use std::collections::HashMap;

use async_trait::async_trait;
use pipe_auth::AuthUser;
use serde_json::Value;

use crate::error::Error;
use crate::pipe::Pipe;

/// A data-source connector plugin.
///
/// Connectors implement source-specific extraction elsewhere in the
/// platform; this trait covers only what the OAuth orchestrator consumes:
/// a stable id, optional authorization parameters, and the post-processing
/// hook invoked after a provider callback has been authenticated.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Stable identifier of this connector (matched against
    /// `Pipe::connector_id`).
    fn id(&self) -> &str;

    /// Extra authorization parameters merged into the provider redirect.
    ///
    /// The default is empty: connectors without provider quirks don't
    /// implement this.
    fn authorization_params(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Post-processing hook invoked once per authenticated callback.
    ///
    /// `user` is the authenticated profile (with auth info attached),
    /// `pipe` the configuration the callback belongs to, and `info` the
    /// auxiliary auth data from the middleware. Returns the updated pipe
    /// configuration to resume setup with; `Ok(None)` means the connector
    /// produced neither an error nor a pipe, which callers treat as fatal.
    async fn auth_callback_post_processing(
        &self,
        user: AuthUser,
        pipe: Pipe,
        info: Option<Value>,
    ) -> Result<Option<Pipe>, Error>;
}
