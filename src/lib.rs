//! # Tessera
//!
//! `tessera` is the API behind a membership dashboard. Members are provisioned
//! into a Postgres table by an out-of-band process; credentials, sessions, and
//! recovery tokens live in a hosted Identity Provider. What this service owns
//! is the glue the dashboard needs:
//!
//! - **Password reset issuance** (`POST /v1/auth/password-reset`): looks up
//!   the member, asks the provider to mint a single-use recovery token, and
//!   mails a first-party reset link. The response is the same generic success
//!   on every path, so callers cannot probe which emails are registered.
//! - **Redemption** (`/v1/auth/password-reset/redeem`, `/v1/auth/password`):
//!   turns the mailed token into a verified session and then into a new
//!   password. The [`reset::RedeemFlow`] state machine drives the same
//!   primitives for embedded frontends.
//! - **Member profile** (`GET /v1/members/me`): token balance and
//!   purchase-round badge for the session's member row.
//!
//! External collaborators sit behind two seams: [`identity::IdentityProvider`]
//! and [`mail::MailSender`]. Recovery tokens are never persisted here; the
//! service only transports them from mint to redemption.

pub mod api;
pub mod cli;
pub mod identity;
pub mod mail;
pub mod members;
pub mod reset;

pub use api::GIT_COMMIT_HASH;
