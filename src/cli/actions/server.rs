use crate::{
    api,
    identity::HostedIdentityProvider,
    mail::{HttpMailer, LogMailSender, MailSender},
    reset::ResetConfig,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Validated server configuration. `SecretString` keeps keys out of Debug output.
#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub provider_url: String,
    pub provider_service_key: SecretString,
    pub mail_api_url: String,
    pub mail_api_key: Option<SecretString>,
    pub mail_from: String,
    pub mail_subject: String,
    pub app_base_url: String,
    pub reset_token_ttl_seconds: i64,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if any configured URL is invalid or the server fails to
/// start.
pub async fn execute(args: Args) -> Result<()> {
    let provider_url = Url::parse(&args.provider_url)
        .with_context(|| format!("Invalid provider URL: {}", args.provider_url))?;
    let app_base_url = Url::parse(&args.app_base_url)
        .with_context(|| format!("Invalid app base URL: {}", args.app_base_url))?;

    let provider = Arc::new(HostedIdentityProvider::new(
        provider_url,
        args.provider_service_key,
    )?);

    let mailer: Arc<dyn MailSender> = match args.mail_api_key {
        Some(api_key) => {
            let mail_api_url = Url::parse(&args.mail_api_url)
                .with_context(|| format!("Invalid mail API URL: {}", args.mail_api_url))?;
            Arc::new(HttpMailer::new(mail_api_url, api_key)?)
        }
        None => {
            info!("No mail API key configured; outbound mail will be logged");
            Arc::new(LogMailSender)
        }
    };

    let reset_config = ResetConfig::new(&app_base_url)?
        .with_mail_from(args.mail_from)
        .with_mail_subject(args.mail_subject)
        .with_token_ttl_seconds(args.reset_token_ttl_seconds);

    api::new(args.port, args.dsn, provider, mailer, reset_config).await
}
