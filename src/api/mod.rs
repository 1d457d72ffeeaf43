//! HTTP surface: router construction and server lifecycle.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post, put},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::identity::IdentityProvider;
use crate::mail::MailSender;
use crate::members::{MemberStore, PgMemberStore};
use crate::reset::{Issuer, ResetConfig};

pub mod handlers;
mod openapi;

pub use openapi::ApiDoc;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Build the application router around the given collaborators.
pub fn router(
    pool: sqlx::PgPool,
    provider: Arc<dyn IdentityProvider>,
    members: Arc<dyn MemberStore>,
    issuer: Arc<Issuer>,
) -> Router {
    // The issuance endpoint is called cross-origin from the dashboard, so the
    // CORS policy is permissive with an explicit custom-header allow-list.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("x-request-id"),
        ]);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::health::health))
        .route("/v1/auth/password-reset", post(handlers::reset::issue))
        .route(
            "/v1/auth/password-reset/redeem",
            post(handlers::reset::redeem),
        )
        .route("/v1/auth/password", put(handlers::reset::update_password))
        .route("/v1/members/me", get(handlers::members::me))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(provider))
                .layer(Extension(members))
                .layer(Extension(issuer))
                .layer(Extension(pool)),
        )
}

/// Connect to the database, assemble the issuer, and serve until shutdown.
///
/// # Errors
/// Returns an error if the database connection or the listener fails.
pub async fn new(
    port: u16,
    dsn: String,
    provider: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn MailSender>,
    reset_config: ResetConfig,
) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let members: Arc<dyn MemberStore> = Arc::new(PgMemberStore::new(pool.clone()));
    let issuer = Arc::new(Issuer::new(
        members.clone(),
        provider.clone(),
        mailer,
        reset_config,
    ));

    let app = router(pool, provider, members, issuer);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
