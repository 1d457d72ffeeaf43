use clap::{Arg, Command};

pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_PROVIDER_SERVICE_KEY: &str = "provider-service-key";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long(ARG_PROVIDER_URL)
                .help("Identity provider base URL")
                .env("TESSERA_PROVIDER_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_SERVICE_KEY)
                .long(ARG_PROVIDER_SERVICE_KEY)
                .help("Identity provider admin service key")
                .long_help(
                    "Identity provider admin service key. Grants token minting, so pass it \
                     via the environment in production.",
                )
                .env("TESSERA_PROVIDER_SERVICE_KEY")
                .required(true),
        )
}
