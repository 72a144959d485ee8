//! Controller for OAuth authentication flows.
//!
//! Bridges the passport-style auth middleware to the connector registry:
//! `authorize` starts a flow for a pipe, `callback` finishes it and
//! resumes pipe setup.
//!
//! Note: these endpoints work via browser redirects and therefore cannot
//! require custom headers.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use log::*;
use serde::Deserialize;
use tower_sessions::Session;

use domain::oauth_flow::{self, CallbackContext, CallbackSuccess};
use domain::{CallbackRequest, StateToken};
use service::config::Config;

use crate::error::{Error as WebError, Result as WebResult};
use crate::AppState;

/// Session key the in-flight state token is mirrored under.
const SESSION_STATE_KEY: &str = "passport.oauth.state";

/// Query parameters for starting an OAuth flow
#[derive(Debug, Deserialize)]
pub struct AuthStart {
    /// Return URL the user should land on once pipe setup resumes.
    pub url: Option<String>,
}

/// GET /auth/passport/{pipe_id}
///
/// Initiates the OAuth flow for a pipe by redirecting to the provider's
/// authorization endpoint, with connector-supplied parameters merged in.
#[utoipa::path(
    get,
    path = "/auth/passport/{pipe_id}",
    params(
        ("pipe_id" = String, Path, description = "Id of the pipe to authorize"),
        ("url" = Option<String>, Query, description = "Return URL after setup resumes"),
    ),
    responses(
        (status = 307, description = "Redirect to the provider's authorization endpoint"),
        (status = 404, description = "No pipe record, or no connector registered for it"),
        (status = 500, description = "Pipe configuration could not be retrieved"),
    )
)]
pub async fn authorize(
    State(app_state): State<AppState>,
    session: Session,
    Path(pipe_id): Path<String>,
    Query(params): Query<AuthStart>,
) -> WebResult<impl IntoResponse> {
    debug!("Initiating OAuth flow for pipe [{pipe_id}]");

    let flow = oauth_flow::initiate(
        &app_state.strategies,
        &app_state.connectors,
        app_state.pipes.as_ref(),
        &pipe_id,
        params.url,
    )
    .await?;

    // Mirror the state token into the session so the callback can recover
    // it even when the provider drops the state parameter.
    session
        .insert(SESSION_STATE_KEY, &flow.state)
        .await
        .map_err(session_error)?;

    Ok(Redirect::temporary(&flow.redirect_url))
}

/// GET /auth/passport/callback
///
/// Handles the provider's redirect back after user authorization. On
/// success the user is forwarded to the flow's return URL so pipe setup
/// resumes; failures render as JSON errors (configuration/lookup class)
/// or HTML 401 pages (authentication class).
#[utoipa::path(
    get,
    path = "/auth/passport/callback",
    params(
        ("state" = Option<String>, Query, description = "State token round-tripped through the provider"),
        ("code" = Option<String>, Query, description = "Authorization code from the provider"),
    ),
    responses(
        (status = 307, description = "Redirect to the flow's return URL on success"),
        (status = 400, description = "No pipe id recoverable from state or session"),
        (status = 401, description = "Authentication or connector post-processing failed"),
        (status = 404, description = "No connector registered for the pipe"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<HashMap<String, String>>,
) -> WebResult<impl IntoResponse> {
    let query_state = query.get("state").cloned();
    let session_state: Option<StateToken> = session
        .get(SESSION_STATE_KEY)
        .await
        .map_err(session_error)?;

    let ctx = CallbackContext {
        query_state,
        session_state,
        request: CallbackRequest::new(query),
    };

    let success = oauth_flow::callback(
        &app_state.strategies,
        &app_state.connectors,
        app_state.pipes.as_ref(),
        ctx,
    )
    .await?;

    // State tokens are single-use; drop the session copy once consumed.
    session
        .remove::<StateToken>(SESSION_STATE_KEY)
        .await
        .map_err(session_error)?;

    Ok(Redirect::temporary(&resume_setup_url(
        &app_state.config,
        &success,
    )))
}

/// Where the user lands once the connector has finished post-processing.
fn resume_setup_url(config: &Config, success: &CallbackSuccess) -> String {
    match &success.return_url {
        Some(url) => url.clone(),
        None => {
            let base = config.frontend_base_url().unwrap_or_default();
            format!("{base}/pipes/{}?setup=resumed", success.pipe.id)
        }
    }
}

fn session_error(err: tower_sessions::session::Error) -> WebError {
    warn!("Session store operation failed: {err:?}");
    WebError::from(domain::error::Error {
        source: Some(Box::new(err)),
        error_kind: domain::error::DomainErrorKind::Internal(
            domain::error::InternalErrorKind::Other("Session store failed".to_string()),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use clap::Parser;
    use domain::{
        strategy_error, AuthOutcome, AuthStrategy, AuthUser, Connector, ConnectorApiError,
        ConnectorRegistry, InMemoryPipeStore, Pipe, PipeAuthError, PipeStore, StrategyErrorKind,
        StrategyRegistry,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StubStrategy {
        known_user: bool,
        fail_status: Option<u16>,
    }

    fn ok_strategy() -> StubStrategy {
        StubStrategy {
            known_user: true,
            fail_status: None,
        }
    }

    #[async_trait]
    impl AuthStrategy for StubStrategy {
        fn authorization_url(&self, state: &str, _extra: &HashMap<String, String>) -> String {
            format!("https://provider.test/authorize?state={state}")
        }

        async fn authenticate(
            &self,
            _request: &CallbackRequest,
            _pipe_id: &str,
        ) -> Result<AuthOutcome, PipeAuthError> {
            if let Some(status) = self.fail_status {
                return Err(strategy_error(
                    StrategyErrorKind::Upstream { status },
                    "invalid_grant",
                ));
            }
            if !self.known_user {
                return Ok(AuthOutcome::default());
            }
            Ok(AuthOutcome {
                user: Some(AuthUser {
                    id: "user-1".to_string(),
                    email: Some("ada@example.com".to_string()),
                    name: None,
                    attributes: Value::Null,
                    info: None,
                }),
                info: None,
            })
        }
    }

    struct StubConnector;

    #[async_trait]
    impl Connector for StubConnector {
        fn id(&self) -> &str {
            "salesforce"
        }

        async fn auth_callback_post_processing(
            &self,
            _user: AuthUser,
            pipe: Pipe,
            _info: Option<Value>,
        ) -> Result<Option<Pipe>, ConnectorApiError> {
            Ok(Some(pipe))
        }
    }

    async fn test_state(strategy: StubStrategy) -> AppState {
        let config = Config::parse_from(["web-test"]);

        let connectors = Arc::new(ConnectorRegistry::new());
        connectors.register(Arc::new(StubConnector));

        let strategies = Arc::new(StrategyRegistry::new());
        strategies.add_strategy("pipe-1", Arc::new(strategy));

        let store = InMemoryPipeStore::new();
        store
            .insert(Pipe::new("pipe-1", "Orders sync", "salesforce"))
            .await;
        let pipes: Arc<dyn PipeStore> = Arc::new(store);

        AppState::new(config, connectors, strategies, pipes)
    }

    async fn body_string(body: Body) -> String {
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_authorize_redirects_to_provider() {
        let app = crate::init_server(test_state(ok_strategy()).await);

        let response = app
            .oneshot(get(
                "/auth/passport/pipe-1?url=https://app.example.com/pipes/pipe-1",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://provider.test/authorize?state="));

        // The state parameter decodes back to the requested pipe id
        let raw_state = location.rsplit("state=").next().unwrap();
        let token = StateToken::parse(raw_state).unwrap();
        assert_eq!(token.pipe, "pipe-1");
        assert_eq!(
            token.url.as_deref(),
            Some("https://app.example.com/pipes/pipe-1")
        );
    }

    #[tokio::test]
    async fn test_authorize_unknown_pipe_is_not_found_json() {
        let app = crate::init_server(test_state(ok_strategy()).await);

        let response = app.oneshot(get("/auth/passport/pipe-9")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("application/json"));
        let body: Value = serde_json::from_str(&body_string(response.into_body()).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("pipe-9"));
    }

    #[tokio::test]
    async fn test_callback_without_state_is_bad_request_json() {
        let app = crate::init_server(test_state(ok_strategy()).await);

        let response = app
            .oneshot(get("/auth/passport/callback?code=abc"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("application/json"));
    }

    #[tokio::test]
    async fn test_callback_redirects_to_return_url() {
        let app = crate::init_server(test_state(ok_strategy()).await);
        let token = StateToken::new(
            "pipe-1",
            Some("https://app.example.com/pipes/pipe-1".to_string()),
        );

        let response = app
            .oneshot(get(&format!(
                "/auth/passport/callback?code=abc&state={}",
                token.encode()
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://app.example.com/pipes/pipe-1"
        );
    }

    #[tokio::test]
    async fn test_callback_unknown_user_is_html_unauthorized() {
        let app = crate::init_server(
            test_state(StubStrategy {
                known_user: false,
                fail_status: None,
            })
            .await,
        );
        let token = StateToken::new("pipe-1", None);

        let response = app
            .oneshot(get(&format!(
                "/auth/passport/callback?code=abc&state={}",
                token.encode()
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let body = body_string(response.into_body()).await;
        assert!(body.contains("not known"));
    }

    #[tokio::test]
    async fn test_callback_auth_failure_embeds_upstream_status() {
        let app = crate::init_server(
            test_state(StubStrategy {
                known_user: true,
                fail_status: Some(403),
            })
            .await,
        );
        let token = StateToken::new("pipe-1", None);

        let response = app
            .oneshot(get(&format!(
                "/auth/passport/callback?code=bad&state={}",
                token.encode()
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let body = body_string(response.into_body()).await;
        assert!(body.contains("403"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = crate::init_server(test_state(ok_strategy()).await);

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
