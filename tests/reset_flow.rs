//! End-to-end exercise of the password-reset flow, in process.
//!
//! This suite wires the issuer and the redemption state machine against fakes
//! for the member store, the identity provider, and the mail sender, then
//! walks the whole journey: request a reset, pull the link out of the mail,
//! redeem it, and set a new password. The fakes count every outbound call so
//! the tests can assert what an observer could and could not learn.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tessera::identity::{IdentityProvider, ProviderError, RecoveryLink, RecoverySession};
use tessera::mail::{MailMessage, MailSender};
use tessera::members::{Member, MemberStore};
use tessera::reset::{FlowState, IssueOutcome, Issuer, RedeemFlow, ResetConfig, ResetLink};
use url::Url;
use uuid::Uuid;

const MEMBER_EMAIL: &str = "real.member@example.com";

/// Member store double holding exactly one member.
struct OneMemberStore {
    member: Member,
    lookups: AtomicUsize,
}

impl OneMemberStore {
    fn new() -> Self {
        Self {
            member: Member {
                id: Uuid::new_v4(),
                email: MEMBER_EMAIL.to_string(),
                auth_user_id: Some(Uuid::new_v4()),
                token_balance: 1200,
                purchase_round: "Round 2".to_string(),
            },
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MemberStore for OneMemberStore {
    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Member>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if email_normalized == self.member.email {
            Ok(Some(self.member.clone()))
        } else {
            Ok(None)
        }
    }
}

/// Provider double that mints real-looking tokens and enforces single-use
/// redemption, like the hosted backend does.
#[derive(Default)]
struct TokenVendingProvider {
    mint_calls: AtomicUsize,
    redeem_calls: AtomicUsize,
    update_calls: AtomicUsize,
    next_token: AtomicUsize,
    consumed: Mutex<Vec<String>>,
    fail_mint: bool,
}

#[async_trait]
impl IdentityProvider for TokenVendingProvider {
    async fn mint_recovery_link(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<RecoveryLink, ProviderError> {
        self.mint_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mint {
            return Err(ProviderError::Transport(anyhow!("mint endpoint is down")));
        }
        let token = format!("otp-{}", self.next_token.fetch_add(1, Ordering::SeqCst));
        let action_link = Url::parse(&format!(
            "https://auth.example.com/auth/v1/verify?token={token}&type=recovery&redirect_to={redirect_to}"
        ))
        .map_err(|err| ProviderError::Transport(anyhow!(err)))?;
        let _ = email;
        Ok(RecoveryLink { action_link, token })
    }

    async fn redeem_recovery_token(
        &self,
        token: &str,
        _email: &str,
    ) -> Result<RecoverySession, ProviderError> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        let mut consumed = self.consumed.lock().unwrap();
        if consumed.iter().any(|seen| seen == token) {
            return Err(ProviderError::Rejected(
                "Token has expired or is invalid".to_string(),
            ));
        }
        consumed.push(token.to_string());
        Ok(RecoverySession::new(format!("session-for-{token}")))
    }

    async fn update_credential(
        &self,
        _session: &RecoverySession,
        _new_password: &str,
    ) -> Result<(), ProviderError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn session_email(&self, _session: &RecoverySession) -> Result<String, ProviderError> {
        Ok(MEMBER_EMAIL.to_string())
    }
}

/// Mailer double that captures every delivered message.
#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl MailSender for CapturingMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Store double whose lookups always fail, as with a database outage.
struct BrokenStore;

#[async_trait]
impl MemberStore for BrokenStore {
    async fn find_by_email(&self, _email_normalized: &str) -> Result<Option<Member>> {
        Err(anyhow!("connection pool timed out"))
    }
}

/// Mailer double whose sends always fail, counting the attempts.
#[derive(Default)]
struct BrokenMailer {
    attempts: AtomicUsize,
}

#[async_trait]
impl MailSender for BrokenMailer {
    async fn send(&self, _message: &MailMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("mail API returned 500"))
    }
}

fn config() -> Result<ResetConfig> {
    Ok(ResetConfig::new(&Url::parse("https://app.example.com")?)?)
}

/// Pull the first-party reset URL back out of a captured mail body.
fn link_from_mail(html: &str) -> Result<Url> {
    let start = html
        .find("href=\"")
        .context("mail body carries no link")?
        + "href=\"".len();
    let end = html[start..]
        .find('"')
        .context("mail body link is unterminated")?;
    Url::parse(&html[start..start + end]).context("mail body link is not a URL")
}

#[tokio::test]
async fn member_request_mints_and_mails_exactly_once() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider::default());
    let mailer = Arc::new(CapturingMailer::default());
    let issuer = Issuer::new(
        Arc::new(OneMemberStore::new()),
        provider.clone(),
        mailer.clone(),
        config()?,
    );

    let outcome = issuer.issue(MEMBER_EMAIL).await;

    assert!(outcome.member_found());
    assert!(outcome.minted());
    assert!(outcome.delivered());
    assert_eq!(provider.mint_calls.load(Ordering::SeqCst), 1);

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, MEMBER_EMAIL);
    assert_eq!(sent[0].subject, "Reset your password");
    Ok(())
}

#[tokio::test]
async fn unknown_email_produces_no_side_effects() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider::default());
    let mailer = Arc::new(CapturingMailer::default());
    let issuer = Issuer::new(
        Arc::new(OneMemberStore::new()),
        provider.clone(),
        mailer.clone(),
        config()?,
    );

    let outcome = issuer.issue("stranger@example.com").await;

    assert!(!outcome.member_found());
    assert_eq!(provider.mint_calls.load(Ordering::SeqCst), 0);
    assert!(mailer.sent.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_email_never_reaches_the_store() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider::default());
    let mailer = Arc::new(CapturingMailer::default());
    let store = Arc::new(OneMemberStore::new());
    let issuer = Issuer::new(store.clone(), provider.clone(), mailer.clone(), config()?);

    for raw in ["", "   ", "not-an-email", "two@@example.com"] {
        let outcome = issuer.issue(raw).await;
        assert!(!outcome.member_found(), "{raw:?}");
    }

    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    assert_eq!(provider.mint_calls.load(Ordering::SeqCst), 0);
    assert!(mailer.sent.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn issuance_normalizes_the_requested_email() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider::default());
    let mailer = Arc::new(CapturingMailer::default());
    let issuer = Issuer::new(
        Arc::new(OneMemberStore::new()),
        provider.clone(),
        mailer.clone(),
        config()?,
    );

    let outcome = issuer.issue("  Real.Member@Example.COM ").await;

    assert!(outcome.delivered());
    assert_eq!(mailer.sent.lock().unwrap()[0].to, MEMBER_EMAIL);
    Ok(())
}

#[tokio::test]
async fn mint_failure_swallows_and_skips_mail() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider {
        fail_mint: true,
        ..TokenVendingProvider::default()
    });
    let mailer = Arc::new(CapturingMailer::default());
    let issuer = Issuer::new(
        Arc::new(OneMemberStore::new()),
        provider.clone(),
        mailer.clone(),
        config()?,
    );

    let outcome = issuer.issue(MEMBER_EMAIL).await;

    assert!(outcome.member_found());
    assert!(!outcome.minted());
    assert!(!outcome.delivered());
    assert!(mailer.sent.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn lookup_failure_swallows_and_skips_mint_and_mail() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider::default());
    let mailer = Arc::new(CapturingMailer::default());
    let issuer = Issuer::new(
        Arc::new(BrokenStore),
        provider.clone(),
        mailer.clone(),
        config()?,
    );

    let outcome = issuer.issue(MEMBER_EMAIL).await;

    assert_eq!(outcome, IssueOutcome::default());
    assert_eq!(provider.mint_calls.load(Ordering::SeqCst), 0);
    assert!(mailer.sent.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn delivery_failure_swallows_after_a_single_attempt() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider::default());
    let mailer = Arc::new(BrokenMailer::default());
    let issuer = Issuer::new(
        Arc::new(OneMemberStore::new()),
        provider.clone(),
        mailer.clone(),
        config()?,
    );

    let outcome = issuer.issue(MEMBER_EMAIL).await;

    assert!(outcome.member_found());
    assert!(outcome.minted());
    assert!(!outcome.delivered());
    // One send, no retry.
    assert_eq!(mailer.attempts.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn full_journey_from_request_to_new_password() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider::default());
    let mailer = Arc::new(CapturingMailer::default());
    let issuer = Issuer::new(
        Arc::new(OneMemberStore::new()),
        provider.clone(),
        mailer.clone(),
        config()?,
    );

    // 1. The member asks for a reset; a mail goes out.
    let outcome = issuer.issue(MEMBER_EMAIL).await;
    assert!(outcome.delivered());

    // 2. The link in the mail points at the first-party reset page and parses
    //    back into the recovery shape.
    let mailed_url = link_from_mail(&mailer.sent.lock().unwrap()[0].html)?;
    assert!(mailed_url
        .as_str()
        .starts_with("https://app.example.com/reset-password?"));
    let link = ResetLink::parse(&mailed_url).context("mailed link did not parse")?;

    // 3. Landing on the page redeems the token and unlocks the form.
    let mut flow = RedeemFlow::new(provider.clone());
    assert_eq!(flow.verify(Some(link.clone())).await, FlowState::Valid);

    // 4. Submitting a matching, long-enough password succeeds.
    let state = flow.submit("brand-new-secret", "brand-new-secret").await?;
    assert_eq!(state, FlowState::Success);
    assert_eq!(provider.update_calls.load(Ordering::SeqCst), 1);

    // 5. Replaying the same link afterwards fails: the token was consumed.
    let mut replay = RedeemFlow::new(provider.clone());
    assert_eq!(replay.verify(Some(link)).await, FlowState::Invalid);
    Ok(())
}

#[tokio::test]
async fn failed_submission_keeps_the_session_for_a_retry() -> Result<()> {
    let provider = Arc::new(TokenVendingProvider::default());
    let mailer = Arc::new(CapturingMailer::default());
    let issuer = Issuer::new(
        Arc::new(OneMemberStore::new()),
        provider.clone(),
        mailer.clone(),
        config()?,
    );

    issuer.issue(MEMBER_EMAIL).await;
    let mailed_url = link_from_mail(&mailer.sent.lock().unwrap()[0].html)?;
    let link = ResetLink::parse(&mailed_url).context("mailed link did not parse")?;

    let mut flow = RedeemFlow::new(provider.clone());
    flow.verify(Some(link)).await;

    // A local validation failure costs nothing and the form stays open.
    let err = flow.submit("abc123", "abc124").await.unwrap_err();
    assert_eq!(err.to_string(), "Passwords Don't Match");
    assert_eq!(flow.state(), FlowState::Valid);
    assert_eq!(provider.update_calls.load(Ordering::SeqCst), 0);

    // The corrected retry goes through on the same session, no new token.
    let state = flow.submit("abc123", "abc123").await?;
    assert_eq!(state, FlowState::Success);
    assert_eq!(provider.redeem_calls.load(Ordering::SeqCst), 1);
    Ok(())
}
