//! Password-reset flow: issuance, link transport, and redemption.
//!
//! The issuer side answers every request with the same generic success so an
//! observer cannot tell registered emails from unknown ones. The redeemer side
//! is a small state machine that turns a mailed link into a verified session
//! and finally into a credential update. Recovery tokens themselves live
//! entirely inside the Identity Provider; this module only moves them.

use anyhow::{Context, Result};
use regex::Regex;
use url::Url;

pub mod issuer;
pub mod link;
pub mod redeemer;

pub use issuer::{IssueOutcome, Issuer};
pub use link::ResetLink;
pub use redeemer::{FlowState, PasswordIssue, RedeemFlow, SubmitError};

/// Relative path of the page the reset link lands on.
const RESET_PAGE_PATH: &str = "reset-password";

/// Default recovery-token lifetime, matching the provider default.
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

/// Normalize an email before any lookup or comparison.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Shape check for an already-normalized email.
#[must_use]
pub fn is_valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Issuer-side configuration: where reset links point and how the mail reads.
#[derive(Clone, Debug)]
pub struct ResetConfig {
    reset_page_url: Url,
    mail_from: String,
    mail_subject: String,
    token_ttl_seconds: i64,
}

impl ResetConfig {
    /// Build a config rooted at the first-party app URL.
    ///
    /// # Errors
    /// Returns an error if the reset page URL cannot be derived from the base.
    pub fn new(app_base_url: &Url) -> Result<Self> {
        // Ensure a trailing slash so join() appends instead of replacing.
        let base = if app_base_url.path().ends_with('/') {
            app_base_url.clone()
        } else {
            Url::parse(&format!("{}/", app_base_url))
                .context("invalid app base URL")?
        };
        let reset_page_url = base
            .join(RESET_PAGE_PATH)
            .context("failed to derive reset page URL")?;

        Ok(Self {
            reset_page_url,
            mail_from: "Tessera <noreply@tessera.dev>".to_string(),
            mail_subject: "Reset your password".to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        })
    }

    #[must_use]
    pub fn with_mail_from(mut self, from: String) -> Self {
        self.mail_from = from;
        self
    }

    #[must_use]
    pub fn with_mail_subject(mut self, subject: String) -> Self {
        self.mail_subject = subject;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn reset_page_url(&self) -> &Url {
        &self.reset_page_url
    }

    #[must_use]
    pub fn mail_from(&self) -> &str {
        &self.mail_from
    }

    #[must_use]
    pub fn mail_subject(&self) -> &str {
        &self.mail_subject
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }
}
