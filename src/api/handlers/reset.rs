//! Password-reset endpoints.
//!
//! Issuance always answers with the same generic success: nothing in the
//! status, body, or side effects may tell the caller whether the email is
//! registered or whether mail went out. Redemption and credential update are
//! allowed to fail loudly, since the caller already holds (or held) a token.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::identity::{IdentityProvider, ProviderError};
use crate::reset::redeemer::{validate_new_password, INVALID_LINK_NOTICE};
use crate::reset::{normalize_email, Issuer};

use super::bearer_session;

/// The one message every issuance request gets back.
pub const GENERIC_RESET_MESSAGE: &str =
    "If this email is registered, you will receive a password reset link.";

const UNEXPECTED_ERROR_NOTICE: &str = "An unexpected error occurred. Please try again.";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordResetResponse {
    pub success: bool,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RedeemRequest {
    pub token: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RedeemResponse {
    pub access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdatePasswordRequest {
    pub password: String,
    pub confirm: String,
}

fn generic_success() -> (StatusCode, Json<PasswordResetResponse>) {
    (
        StatusCode::OK,
        Json(PasswordResetResponse {
            success: true,
            message: GENERIC_RESET_MESSAGE.to_string(),
        }),
    )
}

/// Start a password reset for an email address.
#[utoipa::path(
    post,
    path = "/v1/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Accepted; the response never reveals whether the email is registered", body = [PasswordResetResponse])
    ),
    tag = "auth"
)]
pub async fn issue(
    issuer: Extension<Arc<Issuer>>,
    payload: Option<Json<PasswordResetRequest>>,
) -> impl IntoResponse {
    // A missing payload takes the same path as any internal failure: the
    // generic success, with zero side effects.
    let email = payload.map(|Json(request)| request.email).unwrap_or_default();

    let outcome = issuer.issue(&email).await;
    debug!(
        member_found = outcome.member_found(),
        minted = outcome.minted(),
        delivered = outcome.delivered(),
        "reset issuance handled"
    );

    generic_success()
}

/// Redeem a recovery token for a verified session.
#[utoipa::path(
    post,
    path = "/v1/auth/password-reset/redeem",
    request_body = RedeemRequest,
    responses(
        (status = 200, description = "Session established", body = [RedeemResponse]),
        (status = 400, description = "Token absent, expired, or already consumed", body = String)
    ),
    tag = "auth"
)]
pub async fn redeem(
    provider: Extension<Arc<dyn IdentityProvider>>,
    payload: Option<Json<RedeemRequest>>,
) -> impl IntoResponse {
    let request = match payload {
        Some(Json(request)) => request,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let token = request.token.trim();
    let email = normalize_email(&request.email);
    if token.is_empty() || email.is_empty() {
        return (StatusCode::BAD_REQUEST, INVALID_LINK_NOTICE.to_string()).into_response();
    }

    match provider.redeem_recovery_token(token, &email).await {
        Ok(session) => (
            StatusCode::OK,
            Json(RedeemResponse {
                access_token: session.access_token.expose_secret().to_string(),
            }),
        )
            .into_response(),
        Err(ProviderError::Rejected(reason)) => {
            debug!("recovery token rejected: {reason}");
            (StatusCode::BAD_REQUEST, INVALID_LINK_NOTICE.to_string()).into_response()
        }
        Err(ProviderError::Transport(err)) => {
            error!("recovery token redemption failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                UNEXPECTED_ERROR_NOTICE.to_string(),
            )
                .into_response()
        }
    }
}

/// Set a new password for the session established by redemption.
#[utoipa::path(
    put,
    path = "/v1/auth/password",
    request_body = UpdatePasswordRequest,
    params(
        ("Authorization" = String, Header, description = "Bearer session from redemption")
    ),
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Passwords mismatch, too short, or rejected by the provider", body = String),
        (status = 401, description = "No session", body = String)
    ),
    tag = "auth"
)]
pub async fn update_password(
    headers: HeaderMap,
    provider: Extension<Arc<dyn IdentityProvider>>,
    payload: Option<Json<UpdatePasswordRequest>>,
) -> impl IntoResponse {
    let Some(session) = bearer_session(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            "Session required. Please request a new password reset link.".to_string(),
        )
            .into_response();
    };

    let request = match payload {
        Some(Json(request)) => request,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Local checks first; a failed one must not reach the provider.
    if let Err(issue) = validate_new_password(&request.password, &request.confirm) {
        return (StatusCode::BAD_REQUEST, issue.to_string()).into_response();
    }

    match provider.update_credential(&session, &request.password).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(ProviderError::Rejected(message)) => {
            // The provider's own message is actionable (weak password, stale
            // session) and safe to show.
            (StatusCode::BAD_REQUEST, message).into_response()
        }
        Err(ProviderError::Transport(err)) => {
            error!("credential update failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                UNEXPECTED_ERROR_NOTICE.to_string(),
            )
                .into_response()
        }
    }
}
