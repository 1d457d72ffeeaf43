//! Redemption state machine: from mailed link to updated credential.
//!
//! `Verifying -> {Valid, Invalid}` and `Valid -> Submitting -> {Success,
//! back to Valid}`. `Invalid` and `Success` are terminal; the embedding UI
//! redirects away from both (after [`SUCCESS_REDIRECT_DELAY`] on success).
//! Password checks that fail locally never reach the provider.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::error;

use crate::identity::{IdentityProvider, ProviderError, RecoverySession};

use super::ResetLink;

/// Minimum accepted password length, enforced before any provider call.
pub const MIN_PASSWORD_LEN: usize = 6;

/// How long the UI shows the success state before navigating to the dashboard.
pub const SUCCESS_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Notice shown when the link carries no redeemable token.
pub const INVALID_LINK_NOTICE: &str =
    "Invalid or expired link. Please request a new password reset link.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    /// Initial state: the incoming URL has not been inspected yet.
    Verifying,
    /// A verified session exists; the password form may be submitted.
    Valid,
    /// A submission is in flight.
    Submitting,
    /// Credential updated; redirect after [`SUCCESS_REDIRECT_DELAY`].
    Success,
    /// Link was absent, expired, or already consumed. Terminal.
    Invalid,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PasswordIssue {
    #[error("Passwords Don't Match")]
    Mismatch,
    #[error("Password Too Short")]
    TooShort,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Local validation failed; no network call was made.
    #[error("{0}")]
    Password(#[from] PasswordIssue),
    /// The provider refused the update; its message is shown verbatim.
    #[error("{0}")]
    Provider(String),
    /// Transport or response-shape failure, mapped to a generic notice.
    #[error("An unexpected error occurred. Please try again.")]
    Unexpected,
    /// `submit` was called outside the `Valid` state.
    #[error("no verified session to submit against")]
    NotVerified,
}

/// Check the two password inputs without touching the network.
///
/// # Errors
/// Returns the user-facing issue when the inputs differ or are too short.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), PasswordIssue> {
    if password != confirm {
        return Err(PasswordIssue::Mismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordIssue::TooShort);
    }
    Ok(())
}

/// Drives one reset attempt against the Identity Provider.
pub struct RedeemFlow {
    provider: Arc<dyn IdentityProvider>,
    state: FlowState,
    session: Option<RecoverySession>,
}

impl RedeemFlow {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: FlowState::Verifying,
            session: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Inspect the incoming link and establish a session if possible.
    ///
    /// Only meaningful from `Verifying`; calling it in any other state leaves
    /// the machine untouched.
    pub async fn verify(&mut self, link: Option<ResetLink>) -> FlowState {
        if self.state != FlowState::Verifying {
            return self.state;
        }

        match link {
            Some(ResetLink::Established { access_token }) => {
                // The provider-hosted flow already established the session;
                // the fragment token is that session.
                self.session = Some(RecoverySession::new(access_token));
                self.state = FlowState::Valid;
            }
            Some(ResetLink::Recovery { token, email }) => {
                match self.provider.redeem_recovery_token(&token, &email).await {
                    Ok(session) => {
                        self.session = Some(session);
                        self.state = FlowState::Valid;
                    }
                    Err(err) => {
                        error!("recovery token redemption failed: {err}");
                        self.state = FlowState::Invalid;
                    }
                }
            }
            None => {
                self.state = FlowState::Invalid;
            }
        }

        self.state
    }

    /// Submit the new password against the established session.
    ///
    /// # Errors
    /// Local validation issues and provider rejections return the user-facing
    /// error and leave the machine in `Valid` for another attempt.
    pub async fn submit(&mut self, password: &str, confirm: &str) -> Result<FlowState, SubmitError> {
        if self.state != FlowState::Valid {
            return Err(SubmitError::NotVerified);
        }

        validate_new_password(password, confirm)?;

        let session = self.session.as_ref().ok_or(SubmitError::NotVerified)?;

        self.state = FlowState::Submitting;
        match self.provider.update_credential(session, password).await {
            Ok(()) => {
                self.state = FlowState::Success;
                Ok(self.state)
            }
            Err(ProviderError::Rejected(message)) => {
                self.state = FlowState::Valid;
                Err(SubmitError::Provider(message))
            }
            Err(ProviderError::Transport(err)) => {
                error!("credential update failed: {err}");
                self.state = FlowState::Valid;
                Err(SubmitError::Unexpected)
            }
        }
    }
}
