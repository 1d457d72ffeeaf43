//! OpenAPI document for the served routes.

use utoipa::OpenApi;

use super::handlers::{health, members, reset};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        reset::issue,
        reset::redeem,
        reset::update_password,
        members::me,
    ),
    components(schemas(
        health::Health,
        reset::PasswordResetRequest,
        reset::PasswordResetResponse,
        reset::RedeemRequest,
        reset::RedeemResponse,
        reset::UpdatePasswordRequest,
        members::MemberProfile,
    )),
    tags(
        (name = "auth", description = "Password reset issuance and redemption"),
        (name = "members", description = "Member profile"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
