//! Member profile endpoint: the dashboard's one data fetch.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::identity::{IdentityProvider, ProviderError};
use crate::members::{IdentityLink, MemberStore};
use crate::reset::normalize_email;

use super::bearer_session;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MemberProfile {
    pub email: String,
    pub token_balance: i64,
    pub purchase_round: String,
    pub identity_linked: bool,
}

/// Fetch the member profile behind the caller's session.
#[utoipa::path(
    get,
    path = "/v1/members/me",
    params(
        ("Authorization" = String, Header, description = "Bearer session token")
    ),
    responses(
        (status = 200, description = "Member profile", body = [MemberProfile]),
        (status = 401, description = "Missing or invalid session", body = String),
        (status = 404, description = "Session email has no member record", body = String)
    ),
    tag = "members"
)]
pub async fn me(
    headers: HeaderMap,
    provider: Extension<Arc<dyn IdentityProvider>>,
    members: Extension<Arc<dyn MemberStore>>,
) -> impl IntoResponse {
    let Some(session) = bearer_session(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Session required".to_string()).into_response();
    };

    let email = match provider.session_email(&session).await {
        Ok(email) => normalize_email(&email),
        Err(ProviderError::Rejected(_)) => {
            return (StatusCode::UNAUTHORIZED, "Session is not valid".to_string())
                .into_response();
        }
        Err(ProviderError::Transport(err)) => {
            error!("session lookup failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Profile lookup failed".to_string(),
            )
                .into_response();
        }
    };

    match members.find_by_email(&email).await {
        Ok(Some(member)) => {
            let identity_linked = matches!(member.identity_link(), IdentityLink::Linked(_));
            Json(MemberProfile {
                email: member.email,
                token_balance: member.token_balance,
                purchase_round: member.purchase_round,
                identity_linked,
            })
            .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            "No member record for this account".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("member profile lookup failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Profile lookup failed".to_string(),
            )
                .into_response()
        }
    }
}
