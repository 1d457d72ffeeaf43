//! Reset issuance: lookup, mint, link, deliver, and never tell.
//!
//! Every failure point is caught on its own and logged; none of them changes
//! what the caller sees. There are no retries on the found path either, so
//! neither body, status, nor timing distinguishes a member email from an
//! unknown one.

use std::sync::Arc;

use tracing::{debug, error};

use crate::identity::IdentityProvider;
use crate::mail::{MailMessage, MailSender};
use crate::members::{IdentityLink, MemberStore};

use super::{is_valid_email, link, normalize_email, ResetConfig};

/// What actually happened during one issuance.
///
/// Server-side observability only; the HTTP response never varies with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IssueOutcome {
    member_found: bool,
    minted: bool,
    delivered: bool,
}

impl IssueOutcome {
    #[must_use]
    pub const fn member_found(&self) -> bool {
        self.member_found
    }

    #[must_use]
    pub const fn minted(&self) -> bool {
        self.minted
    }

    #[must_use]
    pub const fn delivered(&self) -> bool {
        self.delivered
    }
}

/// Orchestrates one password-reset issuance end to end.
pub struct Issuer {
    members: Arc<dyn MemberStore>,
    provider: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn MailSender>,
    config: ResetConfig,
}

impl Issuer {
    #[must_use]
    pub fn new(
        members: Arc<dyn MemberStore>,
        provider: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn MailSender>,
        config: ResetConfig,
    ) -> Self {
        Self {
            members,
            provider,
            mailer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResetConfig {
        &self.config
    }

    /// Run the issuance steps for `raw_email`.
    ///
    /// Infallible by contract: whatever happens inside is logged and absorbed,
    /// and the returned outcome must not leak past the server boundary.
    pub async fn issue(&self, raw_email: &str) -> IssueOutcome {
        let mut outcome = IssueOutcome::default();

        let email = normalize_email(raw_email);
        if !is_valid_email(&email) {
            return outcome;
        }

        let member = match self.members.find_by_email(&email).await {
            Ok(member) => member,
            Err(err) => {
                error!("member lookup failed during reset issuance: {err}");
                return outcome;
            }
        };
        let Some(member) = member else {
            return outcome;
        };
        outcome.member_found = true;

        if member.identity_link() == IdentityLink::Unlinked {
            // The provider matches accounts by email, so minting still works;
            // the missing link is a provisioning concern, not ours to fix.
            debug!(member_id = %member.id, "member has no linked identity account");
        }

        let recovery = match self
            .provider
            .mint_recovery_link(&email, self.config.reset_page_url().as_str())
            .await
        {
            Ok(recovery) => recovery,
            Err(err) => {
                error!("recovery token mint failed: {err}");
                return outcome;
            }
        };
        outcome.minted = true;

        let reset_url = link::build_reset_url(self.config.reset_page_url(), &recovery.token, &email);
        let message = MailMessage {
            from: self.config.mail_from().to_string(),
            to: email,
            subject: self.config.mail_subject().to_string(),
            html: reset_mail_html(reset_url.as_str(), self.config.token_ttl_seconds()),
        };

        match self.mailer.send(&message).await {
            Ok(()) => outcome.delivered = true,
            Err(err) => {
                error!("reset mail delivery failed: {err}");
            }
        }

        outcome
    }
}

/// Render the reset mail body around the first-party link.
fn reset_mail_html(reset_url: &str, ttl_seconds: i64) -> String {
    format!(
        "<html><body>\
         <h2>Reset your password</h2>\
         <p>You requested to reset your password. Click the link below to set a new one:</p>\
         <p><a href=\"{reset_url}\">Reset password</a></p>\
         <p>If you didn't request this, you can safely ignore this email. \
         This link will expire in {}.</p>\
         </body></html>",
        ttl_text(ttl_seconds)
    )
}

fn ttl_text(ttl_seconds: i64) -> String {
    if ttl_seconds >= 3600 && ttl_seconds % 3600 == 0 {
        let hours = ttl_seconds / 3600;
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{hours} hours")
        }
    } else {
        let minutes = (ttl_seconds / 60).max(1);
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_text_rounds_to_hours_or_minutes() {
        assert_eq!(ttl_text(3600), "1 hour");
        assert_eq!(ttl_text(7200), "2 hours");
        assert_eq!(ttl_text(1800), "30 minutes");
        assert_eq!(ttl_text(30), "1 minute");
    }

    #[test]
    fn mail_body_embeds_link_and_expiry() {
        let body = reset_mail_html("https://app.example.com/reset-password?token=t", 3600);
        assert!(body.contains("https://app.example.com/reset-password?token=t"));
        assert!(body.contains("expire in 1 hour"));
    }
}
