//! HTTP token endpoint client

use crate::token::{TokenGrant, TokenSource};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use tracing::{error, warn};

/// OAuth2 grant used for full authentication
#[derive(Clone)]
pub enum Grant {
    /// `grant_type=client_credentials`
    ClientCredentials {
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Space separated scopes
        scope: String,
    },
    /// `grant_type=password` (issues a refresh token)
    Password {
        /// Username
        username: String,
        /// Password
        password: String,
        /// Scope
        scope: String,
    },
}

impl Grant {
    /// Grant type as sent on the wire
    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::ClientCredentials { .. } => "client_credentials",
            Grant::Password { .. } => "password",
        }
    }

    /// Form fields, `grant_type` first
    pub fn form(&self) -> Vec<(&'static str, String)> {
        match self {
            Grant::ClientCredentials {
                client_id,
                client_secret,
                scope,
            } => vec![
                ("grant_type", self.grant_type().to_string()),
                ("client_id", client_id.clone()),
                ("client_secret", client_secret.clone()),
                ("scope", scope.clone()),
            ],
            Grant::Password {
                username,
                password,
                scope,
            } => vec![
                ("grant_type", self.grant_type().to_string()),
                ("username", username.clone()),
                ("password", password.clone()),
                ("scope", scope.clone()),
            ],
        }
    }
}

impl std::fmt::Debug for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grant::ClientCredentials { client_id, scope, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("scope", scope)
                .finish_non_exhaustive(),
            Grant::Password { username, scope, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("scope", scope)
                .finish_non_exhaustive(),
        }
    }
}

/// Form-encoded token endpoint client
#[derive(Debug, Clone)]
pub struct OAuthClient {
    provider: String,
    token_url: String,
    grant: Grant,
    headers: HeaderMap,
    client: Client,
}

impl OAuthClient {
    /// Create a client for `token_url`; `headers` are added to every token request
    pub fn new(
        provider: impl Into<String>,
        token_url: impl Into<String>,
        grant: Grant,
        headers: HeaderMap,
        client: Client,
    ) -> Self {
        Self {
            provider: provider.into(),
            token_url: token_url.into(),
            grant,
            headers,
            client,
        }
    }

    async fn post_form(&self, form: &[(&'static str, String)]) -> Result<TokenGrant> {
        let response = self
            .client
            .post(&self.token_url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(form)
            .send()
            .await
            .map_err(|e| Error::transport(&self.provider, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(&self.provider, e))?;

        if status != 200 {
            let body = String::from_utf8_lossy(&body).into_owned();
            error!(
                "Token endpoint for {} rejected {} grant (HTTP {})",
                self.provider, form[0].1, status
            );
            return Err(Error::Authentication {
                provider: self.provider.clone(),
                status,
                body,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            warn!("Undecodable token response from {}: {}", self.provider, e);
            Error::Serialization(format!("token response from {}: {}", self.provider, e))
        })
    }
}

#[async_trait]
impl TokenSource for OAuthClient {
    async fn authenticate(&self) -> Result<TokenGrant> {
        self.post_form(&self.grant.form()).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let form = [
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
        ];
        self.post_form(&form).await
    }
}
