//! HTTP implementation of [`IdentityProvider`] against a hosted auth backend.
//!
//! The wire shapes follow the GoTrue-style admin API: `generate_link` mints a
//! recovery token, `verify` redeems it for a session, and `user` reads or
//! updates the identity behind a session. Admin calls authenticate with the
//! service key; user calls authenticate with the session's access token.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use url::Url;

use super::{IdentityProvider, ProviderError, RecoveryLink, RecoverySession};

#[derive(Clone, Debug)]
pub struct HostedIdentityProvider {
    base_url: Url,
    service_key: SecretString,
    client: Client,
}

impl HostedIdentityProvider {
    /// Build a provider client for `base_url` using the admin service key.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: Url, service_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::api::APP_USER_AGENT)
            .build()
            .context("failed to build identity provider client")?;

        Ok(Self {
            base_url,
            service_key,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|err| ProviderError::Transport(anyhow!("invalid provider endpoint: {err}")))
    }

    fn admin_request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", self.service_key.expose_secret())
            .bearer_auth(self.service_key.expose_secret())
    }

    fn session_request(
        &self,
        method: reqwest::Method,
        url: Url,
        session: &RecoverySession,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", self.service_key.expose_secret())
            .bearer_auth(session.access_token.expose_secret())
    }
}

/// Pull the raw recovery token out of a provider-hosted action link.
///
/// The hosted link has the shape `{base}/auth/v1/verify?token=...&type=recovery`;
/// the first-party reset mail embeds the token, not the hosted link.
fn action_link_token(action_link: &Url) -> Result<String> {
    action_link
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow!("action link carries no token parameter"))
}

/// Map a non-success provider response to a `ProviderError`.
///
/// 4xx responses carry a user-facing message (`msg`/`error_description`);
/// everything else is a transport failure.
async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body
        .get("msg")
        .or_else(|| body.get("error_description"))
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if status.is_client_error() {
        ProviderError::Rejected(
            message.unwrap_or_else(|| "Request rejected by identity provider".to_string()),
        )
    } else {
        ProviderError::Transport(anyhow!(
            "identity provider returned {status}: {}",
            message.unwrap_or_default()
        ))
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityProvider {
    async fn mint_recovery_link(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<RecoveryLink, ProviderError> {
        let url = self.endpoint("auth/v1/admin/generate_link")?;
        let response = self
            .admin_request(reqwest::Method::POST, url)
            .json(&json!({
                "type": "recovery",
                "email": email,
                "redirect_to": redirect_to,
            }))
            .send()
            .await
            .context("generate_link request failed")?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: Value = response
            .json()
            .await
            .context("generate_link response was not JSON")?;
        let action_link = body
            .get("action_link")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("generate_link response carries no action_link"))?;
        let action_link =
            Url::parse(action_link).context("generate_link returned an invalid action_link")?;
        let token = action_link_token(&action_link)?;

        Ok(RecoveryLink { action_link, token })
    }

    async fn redeem_recovery_token(
        &self,
        token: &str,
        email: &str,
    ) -> Result<RecoverySession, ProviderError> {
        let url = self.endpoint("auth/v1/verify")?;
        let response = self
            .admin_request(reqwest::Method::POST, url)
            .json(&json!({
                "type": "recovery",
                "token": token,
                "email": email,
            }))
            .send()
            .await
            .context("verify request failed")?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: Value = response
            .json()
            .await
            .context("verify response was not JSON")?;
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("verify response carries no access_token"))?;

        Ok(RecoverySession::new(access_token))
    }

    async fn update_credential(
        &self,
        session: &RecoverySession,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .session_request(reqwest::Method::PUT, url, session)
            .json(&json!({ "password": new_password }))
            .send()
            .await
            .context("credential update request failed")?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }

    async fn session_email(&self, session: &RecoverySession) -> Result<String, ProviderError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .session_request(reqwest::Method::GET, url, session)
            .send()
            .await
            .context("session lookup request failed")?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Rejected("Session is not valid".to_string()));
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: Value = response
            .json()
            .await
            .context("session lookup response was not JSON")?;
        body.get("email")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::Transport(anyhow!("session lookup response carries no email"))
            })
    }
}
