//! Member records and the store they are read from.
//!
//! Members are provisioned by an out-of-band process; this service only ever
//! reads them. The password-reset issuer needs a single question answered,
//! "does a member with this email exist?", and the profile endpoint needs the
//! balance and purchase-round columns for one row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// A person entitled to use the dashboard, keyed by email.
///
/// `auth_user_id` links the row to an Identity Provider account. The link is
/// created by a collaborator outside this service; here it is only observable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: Uuid,
    /// Stored normalized: trimmed and lowercased.
    pub email: String,
    pub auth_user_id: Option<Uuid>,
    pub token_balance: i64,
    pub purchase_round: String,
}

/// Whether a member row has been linked to an Identity Provider account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityLink {
    Linked(Uuid),
    Unlinked,
}

impl Member {
    #[must_use]
    pub fn identity_link(&self) -> IdentityLink {
        match self.auth_user_id {
            Some(id) => IdentityLink::Linked(id),
            None => IdentityLink::Unlinked,
        }
    }
}

/// Read access to the members table.
///
/// Callers must pass already-normalized emails; the store does not repeat the
/// normalization.
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Member>>;
}

/// `MemberStore` backed by the Postgres members table.
#[derive(Clone, Debug)]
pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberStore for PgMemberStore {
    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Member>> {
        let query = r"
            SELECT id, email, auth_user_id, token_balance, purchase_round
            FROM members
            WHERE email = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email_normalized)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up member by email")?;

        Ok(row.map(|row| Member {
            id: row.get("id"),
            email: row.get("email"),
            auth_user_id: row.get("auth_user_id"),
            token_balance: row.get("token_balance"),
            purchase_round: row.get("purchase_round"),
        }))
    }
}
