//! OAuth flow orchestration.
//!
//! Bridges the HTTP-facing auth middleware (`pipe-auth`) to the connector
//! registry and the pipe configuration store. Two operations: `initiate`
//! builds the provider redirect for a pipe, `callback` authenticates the
//! provider's answer, hands the user to the pipe's connector for
//! post-processing, and returns the updated configuration so pipe setup
//! can resume. Every callback branch is terminal: exactly one outcome per
//! request, no retries.

use crate::error::{AuthErrorKind, DomainErrorKind, Error, FlowErrorKind};
use connector_api::{ConnectorRegistry, Pipe, PipeStore};
use log::*;
use pipe_auth::error::{strategy_error, StrategyErrorKind};
use pipe_auth::{AuthUser, CallbackRequest, StateToken, StrategyRegistry};

/// Result of initiating an authorization flow: where to send the browser,
/// and the state token the web layer mirrors into the session.
#[derive(Debug, Clone)]
pub struct InitiatedFlow {
    pub redirect_url: String,
    pub state: StateToken,
}

/// Inbound context for one provider callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackContext {
    /// Raw `state` query parameter, if the provider round-tripped one.
    pub query_state: Option<String>,
    /// State token recovered from the session, if any.
    pub session_state: Option<StateToken>,
    /// Remaining callback query data, consumed by the strategy.
    pub request: CallbackRequest,
}

/// Successful callback outcome, handed to the caller's completion path.
#[derive(Debug, Clone)]
pub struct CallbackSuccess {
    /// Updated pipe configuration returned by the connector.
    pub pipe: Pipe,
    /// Authenticated user, with auth info attached.
    pub user: AuthUser,
    /// Return URL recovered from the state token.
    pub return_url: Option<String>,
}

/// Initiate an OAuth authorization flow for a pipe.
///
/// Resolves the pipe's connector and strategy, builds a fresh state token,
/// and merges connector-supplied authorization parameters into the
/// provider redirect. The only side effect is the session mutation the
/// caller performs with the returned token.
pub async fn initiate(
    strategies: &StrategyRegistry,
    connectors: &ConnectorRegistry,
    pipes: &dyn PipeStore,
    pipe_id: &str,
    return_url: Option<String>,
) -> Result<InitiatedFlow, Error> {
    // A missing record at initiation means there is nothing to connect;
    // only a store failure is a lookup error here.
    let pipe = match pipes.get_pipe(&pipe_id.to_string()).await {
        Ok(Some(pipe)) => pipe,
        Ok(None) => {
            warn!("No pipe record for id [{pipe_id}]");
            return Err(flow_error(
                FlowErrorKind::ConnectorNotFound,
                &format!("no pipe record for id {pipe_id}"),
            ));
        }
        Err(e) => {
            warn!("Pipe lookup failed for id [{pipe_id}]: {e}");
            return Err(e.into());
        }
    };

    let connector = connectors.connector_for_pipe(&pipe).ok_or_else(|| {
        warn!(
            "No connector registered for pipe [{pipe_id}] (connector id [{}])",
            pipe.connector_id
        );
        flow_error(
            FlowErrorKind::ConnectorNotFound,
            &format!("no connector registered for pipe {pipe_id}"),
        )
    })?;

    let strategy = strategies.get(pipe_id).ok_or_else(|| {
        warn!("No auth strategy registered for pipe [{pipe_id}]");
        Error::from(strategy_error(
            StrategyErrorKind::NotRegistered,
            &format!("no auth strategy registered for pipe {pipe_id}"),
        ))
    })?;

    let state = StateToken::new(pipe_id, return_url);
    let params = connector.authorization_params();
    let redirect_url = strategy.authorization_url(&state.encode(), &params);

    info!(
        "Initiating OAuth flow for pipe [{pipe_id}] via connector [{}]",
        connector.id()
    );

    Ok(InitiatedFlow {
        redirect_url,
        state,
    })
}

/// Handle a provider callback.
///
/// Linear decision tree; each failure branch is terminal and maps to one
/// HTTP response class in the web layer:
/// 1. recover the state token (query parameter wins, session is fallback),
/// 2. authenticate through the strategy registered for the pipe id,
/// 3. load the pipe configuration and resolve its connector,
/// 4. run the connector's post-processing hook inside a fault boundary,
/// 5. propagate the updated pipe to the caller's completion path.
pub async fn callback(
    strategies: &StrategyRegistry,
    connectors: &ConnectorRegistry,
    pipes: &dyn PipeStore,
    ctx: CallbackContext,
) -> Result<CallbackSuccess, Error> {
    // 1. Recover the pipe id before touching the middleware.
    let token = match ctx.query_state {
        Some(raw) => StateToken::parse(&raw)?,
        None => ctx.session_state.ok_or_else(|| {
            warn!("OAuth callback with no state in query or session");
            flow_error(
                FlowErrorKind::MissingPipeId,
                "no pipe id in callback state or session",
            )
        })?,
    };
    let pipe_id = token.pipe.clone();

    // 2. Authenticate via the strategy keyed by the pipe id.
    let strategy = strategies.get(&pipe_id).ok_or_else(|| {
        warn!("No auth strategy registered for pipe [{pipe_id}]");
        Error::from(strategy_error(
            StrategyErrorKind::NotRegistered,
            &format!("no auth strategy registered for pipe {pipe_id}"),
        ))
    })?;

    let outcome = strategy
        .authenticate(&ctx.request, &pipe_id)
        .await
        .inspect_err(|e| warn!("Authentication failed for pipe [{pipe_id}]: {e}"))?;

    let mut user = match outcome.user {
        Some(user) => user,
        None => {
            warn!("Authenticated callback for pipe [{pipe_id}] but user not known to data source");
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::Auth(AuthErrorKind::UnknownUser),
            });
        }
    };
    user.attach_info(outcome.info.clone());

    // 3. Load the pipe and resolve its connector.
    let pipe = fetch_pipe(pipes, &pipe_id).await?;

    let connector = connectors.connector_for_pipe(&pipe).ok_or_else(|| {
        warn!(
            "No connector registered for pipe [{pipe_id}] (connector id [{}])",
            pipe.connector_id
        );
        flow_error(
            FlowErrorKind::ConnectorNotFound,
            &format!("no connector registered for pipe {pipe_id}"),
        )
    })?;
    let connector_id = connector.id().to_string();

    // 4. Post-processing inside a fault boundary: the hook runs on its own
    // task so a panicking connector is contained instead of tearing down
    // the request-handling process.
    let task_user = user.clone();
    let task_pipe = pipe.clone();
    let task_info = outcome.info;
    let joined = tokio::spawn(async move {
        connector
            .auth_callback_post_processing(task_user, task_pipe, task_info)
            .await
    })
    .await;

    let post_result = match joined {
        Ok(result) => result,
        Err(join_error) => {
            error!(
                "Connector [{connector_id}] fault while post-processing pipe [{pipe_id}]: {join_error}"
            );
            return Err(Error {
                source: Some(Box::new(join_error)),
                error_kind: DomainErrorKind::Auth(AuthErrorKind::ConnectorFault {
                    connector_id: connector_id.clone(),
                    pipe_id: pipe_id.clone(),
                }),
            });
        }
    };

    // 5. Post-processing outcomes.
    match post_result {
        Err(e) => {
            warn!("Connector [{connector_id}] post-processing failed for pipe [{pipe_id}]: {e}");
            Err(Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::Auth(AuthErrorKind::PostProcessing {
                    connector_id: connector_id.clone(),
                    pipe_id: pipe_id.clone(),
                }),
            })
        }
        Ok(None) => {
            error!(
                "Connector [{connector_id}] returned neither error nor pipe for pipe [{pipe_id}]"
            );
            Err(flow_error(
                FlowErrorKind::EmptyConnectorResult,
                &format!("connector {connector_id} returned an empty result for pipe {pipe_id}"),
            ))
        }
        Ok(Some(updated_pipe)) => {
            info!("OAuth flow completed for pipe [{pipe_id}] via connector [{connector_id}]");
            Ok(CallbackSuccess {
                pipe: updated_pipe,
                user,
                return_url: token.url,
            })
        }
    }
}

/// Fetch a pipe configuration, treating a missing record as a lookup failure.
async fn fetch_pipe(pipes: &dyn PipeStore, pipe_id: &str) -> Result<Pipe, Error> {
    match pipes.get_pipe(&pipe_id.to_string()).await {
        Ok(Some(pipe)) => Ok(pipe),
        Ok(None) => {
            warn!("No pipe record for id [{pipe_id}]");
            Err(flow_error(
                FlowErrorKind::PipeLookup,
                &format!("no pipe record for id {pipe_id}"),
            ))
        }
        Err(e) => {
            warn!("Pipe lookup failed for id [{pipe_id}]: {e}");
            Err(e.into())
        }
    }
}

fn flow_error(kind: FlowErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: DomainErrorKind::Flow(kind),
    }
}
