//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary should run, keeping
//! secrets wrapped in `SecretString` from the moment they leave clap.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{mail, provider, reset};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let provider_url = matches
        .get_one::<String>(provider::ARG_PROVIDER_URL)
        .cloned()
        .context("missing required argument: --provider-url")?;
    let provider_service_key = matches
        .get_one::<String>(provider::ARG_PROVIDER_SERVICE_KEY)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --provider-service-key")?;

    let mail_api_key = matches
        .get_one::<String>(mail::ARG_MAIL_API_KEY)
        .cloned()
        .map(SecretString::from);

    Ok(Action::Server(Args {
        port,
        dsn,
        provider_url,
        provider_service_key,
        mail_api_url: matches
            .get_one::<String>(mail::ARG_MAIL_API_URL)
            .cloned()
            .unwrap_or_else(|| "https://api.resend.com/".to_string()),
        mail_api_key,
        mail_from: matches
            .get_one::<String>(mail::ARG_MAIL_FROM)
            .cloned()
            .unwrap_or_default(),
        mail_subject: matches
            .get_one::<String>(mail::ARG_MAIL_SUBJECT)
            .cloned()
            .unwrap_or_default(),
        app_base_url: matches
            .get_one::<String>(reset::ARG_APP_BASE_URL)
            .cloned()
            .unwrap_or_default(),
        reset_token_ttl_seconds: matches
            .get_one::<i64>(reset::ARG_RESET_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(3600),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn dispatch_builds_server_action() {
        temp_env::with_vars([("TESSERA_MAIL_API_KEY", None::<&str>)], || {
            let command = crate::cli::commands::new();
            let matches = command.get_matches_from(vec![
                "tessera",
                "--dsn",
                "postgres://user@localhost:5432/tessera",
                "--provider-url",
                "https://auth.tessera.dev",
                "--provider-service-key",
                "service-key",
                "--app-base-url",
                "https://members.tessera.dev",
            ]);

            let Ok(Action::Server(args)) = handler(&matches) else {
                panic!("expected a server action");
            };
            assert_eq!(args.port, 8080);
            assert_eq!(args.provider_url, "https://auth.tessera.dev");
            assert_eq!(args.provider_service_key.expose_secret(), "service-key");
            assert!(args.mail_api_key.is_none());
            assert_eq!(args.app_base_url, "https://members.tessera.dev");
            assert_eq!(args.reset_token_ttl_seconds, 3600);
        });
    }

    #[test]
    fn dispatch_redacts_secrets_in_debug() {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec![
            "tessera",
            "--dsn",
            "postgres://user@localhost:5432/tessera",
            "--provider-url",
            "https://auth.tessera.dev",
            "--provider-service-key",
            "super-secret",
        ]);

        let Ok(action) = handler(&matches) else {
            panic!("expected a server action");
        };
        let debug = format!("{action:?}");
        assert!(!debug.contains("super-secret"));
    }
}
