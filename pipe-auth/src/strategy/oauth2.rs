//! Generic OAuth 2.0 authorization-code strategy.
//!
//! Covers providers that follow the standard code flow: build an
//! authorization URL, exchange the returned code for tokens over a form
//! POST, then fetch the user's profile with the access token. Connectors
//! that need provider quirks beyond extra authorization parameters supply
//! their own `AuthStrategy` implementation instead.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{strategy_error, Error, StrategyErrorKind};
use crate::strategy::{AuthOutcome, AuthStrategy, AuthUser, CallbackRequest};

/// Token response from the provider
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: String,
}

/// Request to exchange authorization code for tokens
#[derive(Debug, Serialize)]
struct TokenExchangeRequest {
    code: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    grant_type: String,
}

/// Provider endpoint URLs for one OAuth 2.0 integration.
#[derive(Debug, Clone)]
pub struct EndpointUrls {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

/// OAuth 2.0 authorization-code strategy.
pub struct OAuth2Strategy {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    urls: EndpointUrls,
}

impl OAuth2Strategy {
    /// Create a new strategy for one provider integration.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        scopes: Vec<String>,
        urls: EndpointUrls,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scopes,
            urls,
        })
    }

    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let request = TokenExchangeRequest {
            code: code.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            grant_type: "authorization_code".to_string(),
        };

        debug!("Exchanging OAuth authorization code for tokens");

        let response = self
            .client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to exchange OAuth code: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: crate::error::ErrorKind::Strategy(StrategyErrorKind::Network),
                }
            })?;

        if response.status().is_success() {
            response.json::<TokenResponse>().await.map_err(|e| {
                warn!("Failed to parse token response: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: crate::error::ErrorKind::Strategy(
                        StrategyErrorKind::InvalidResponse,
                    ),
                }
            })
        } else {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Provider rejected code exchange ({status}): {error_text}");
            Err(strategy_error(
                StrategyErrorKind::Upstream { status },
                &error_text,
            ))
        }
    }

    /// Fetch the user's profile with the access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<Value, Error> {
        let response = self
            .client
            .get(&self.urls.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to fetch provider user profile: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: crate::error::ErrorKind::Strategy(StrategyErrorKind::Network),
                }
            })?;

        if response.status().is_success() {
            response.json::<Value>().await.map_err(|e| {
                warn!("Failed to parse user profile: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: crate::error::ErrorKind::Strategy(
                        StrategyErrorKind::InvalidResponse,
                    ),
                }
            })
        } else {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Provider rejected profile fetch ({status}): {error_text}");
            Err(strategy_error(
                StrategyErrorKind::Upstream { status },
                &error_text,
            ))
        }
    }
}

#[async_trait]
impl AuthStrategy for OAuth2Strategy {
    fn authorization_url(&self, state: &str, extra_params: &HashMap<String, String>) -> String {
        let scopes = self.scopes.join(" ");

        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.urls.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(state)
        );

        // Connector-supplied authorization parameters (ex. access_type,
        // prompt) are appended after the standard ones.
        let mut extras: Vec<_> = extra_params.iter().collect();
        extras.sort();
        for (key, value) in extras {
            url.push('&');
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        url
    }

    async fn authenticate(
        &self,
        request: &CallbackRequest,
        pipe_id: &str,
    ) -> Result<AuthOutcome, Error> {
        if let Some(provider_error) = request.error() {
            warn!(pipe_id = %pipe_id, "provider returned error on callback: {provider_error}");
            return Err(strategy_error(
                StrategyErrorKind::Upstream { status: 401 },
                provider_error,
            ));
        }

        let code = request.code().ok_or_else(|| {
            strategy_error(
                StrategyErrorKind::InvalidResponse,
                "callback carries no authorization code",
            )
        })?;

        let tokens = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&tokens.access_token).await?;

        // Providers disagree on the id claim name; try the usual suspects.
        let user_id = profile
            .get("sub")
            .or_else(|| profile.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let user = user_id.map(|id| AuthUser {
            id,
            email: profile
                .get("email")
                .and_then(Value::as_str)
                .map(str::to_string),
            name: profile
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            attributes: profile,
            info: None,
        });

        // Tokens ride along as `info` so the connector's post-processing
        // hook can finish wiring up the pipe's source credentials.
        let info = json!({
            "access_token": tokens.access_token,
            "refresh_token": tokens.refresh_token,
            "expires_in": tokens.expires_in,
            "token_type": tokens.token_type,
            "scope": tokens.scope,
        });

        Ok(AuthOutcome {
            user,
            info: Some(info),
        })
    }
}
