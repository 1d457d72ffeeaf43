//! Mail delivery abstractions.
//!
//! The reset issuer treats delivery as fire-and-forget: a failed send is
//! logged and swallowed, never retried, so response timing stays uniform.
//! `HttpMailer` posts to a transactional email API; `LogMailSender` is the
//! default when no API key is configured and simply logs the payload.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;
use url::Url;

#[derive(Clone, Debug)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mail delivery seam used by the reset issuer.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Deliver a message or return an error; the caller decides what a
    /// failure means.
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Local dev sender that logs instead of delivering.
#[derive(Clone, Debug)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "mail send stub"
        );
        Ok(())
    }
}

/// Sender backed by a transactional email HTTP API.
///
/// Wire shape: `POST {base}/emails` with a bearer API key and a JSON body of
/// `{from, to: [..], subject, html}`.
#[derive(Clone, Debug)]
pub struct HttpMailer {
    base_url: Url,
    api_key: SecretString,
    client: Client,
}

impl HttpMailer {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: Url, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::api::APP_USER_AGENT)
            .build()
            .context("failed to build mail client")?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl MailSender for HttpMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let url = self
            .base_url
            .join("emails")
            .context("invalid mail API endpoint")?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "from": message.from,
                "to": [message.to],
                "subject": message.subject,
                "html": message.html,
            }))
            .send()
            .await
            .context("mail API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("mail API returned {status}: {body}"));
        }

        Ok(())
    }
}
