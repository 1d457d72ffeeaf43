//! Identity Provider seam.
//!
//! The provider owns credentials, sessions, and the whole recovery-token
//! lifecycle (mint, single-use redemption, expiry). This service only
//! transports tokens between the mint call and the redemption call, so the
//! trait below is deliberately small: three recovery primitives plus the
//! session lookup the profile endpoint needs.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub mod hosted;
pub use hosted::HostedIdentityProvider;

/// A freshly minted recovery link.
///
/// `action_link` is the provider-hosted verification URL; `token` is the raw
/// single-use value extracted from it. The issuer embeds `token` in a
/// first-party link and never stores either.
#[derive(Clone, Debug)]
pub struct RecoveryLink {
    pub action_link: Url,
    pub token: String,
}

/// A verified session established by redeeming a recovery token.
#[derive(Clone, Debug)]
pub struct RecoverySession {
    pub access_token: SecretString,
}

impl RecoverySession {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider understood the request and said no (expired token,
    /// consumed token, weak password, unknown session). The message is the
    /// provider's own and is safe to surface to the user.
    #[error("{0}")]
    Rejected(String),
    /// Everything else: network failures, unexpected response shapes.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Mint a single-use "recovery" token for `email` and return the link
    /// carrying it. `redirect_to` is where the provider-hosted flow would land
    /// the user afterwards.
    async fn mint_recovery_link(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<RecoveryLink, ProviderError>;

    /// Redeem a recovery token, establishing a verified session. Exactly one
    /// redemption per token succeeds.
    async fn redeem_recovery_token(
        &self,
        token: &str,
        email: &str,
    ) -> Result<RecoverySession, ProviderError>;

    /// Replace the password of the identity behind an established session.
    async fn update_credential(
        &self,
        session: &RecoverySession,
        new_password: &str,
    ) -> Result<(), ProviderError>;

    /// Resolve a session to the email it authenticates.
    async fn session_email(&self, session: &RecoverySession) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn recovery_session_holds_token() {
        let session = RecoverySession::new("abc123");
        assert_eq!(session.access_token.expose_secret(), "abc123");
    }

    #[test]
    fn rejected_error_displays_provider_message() {
        let err = ProviderError::Rejected("Token has expired or is invalid".to_string());
        assert_eq!(err.to_string(), "Token has expired or is invalid");
    }
}
