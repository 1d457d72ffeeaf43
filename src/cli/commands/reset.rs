use clap::{Arg, Command};

pub const ARG_APP_BASE_URL: &str = "app-base-url";
pub const ARG_RESET_TOKEN_TTL_SECONDS: &str = "reset-token-ttl-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_APP_BASE_URL)
                .long(ARG_APP_BASE_URL)
                .help("First-party app base URL; reset links point at its /reset-password page")
                .env("TESSERA_APP_BASE_URL")
                .default_value("https://tessera.dev"),
        )
        .arg(
            Arg::new(ARG_RESET_TOKEN_TTL_SECONDS)
                .long(ARG_RESET_TOKEN_TTL_SECONDS)
                .help("Recovery token lifetime quoted in the reset mail")
                .env("TESSERA_RESET_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
}
