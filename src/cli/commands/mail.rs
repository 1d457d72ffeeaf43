use clap::{Arg, Command};

pub const ARG_MAIL_API_URL: &str = "mail-api-url";
pub const ARG_MAIL_API_KEY: &str = "mail-api-key";
pub const ARG_MAIL_FROM: &str = "mail-from";
pub const ARG_MAIL_SUBJECT: &str = "mail-subject";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAIL_API_URL)
                .long(ARG_MAIL_API_URL)
                .help("Transactional mail API base URL")
                .env("TESSERA_MAIL_API_URL")
                .default_value("https://api.resend.com/"),
        )
        .arg(
            Arg::new(ARG_MAIL_API_KEY)
                .long(ARG_MAIL_API_KEY)
                .help("Mail API key; without it outbound mail is logged, not sent")
                .env("TESSERA_MAIL_API_KEY"),
        )
        .arg(
            Arg::new(ARG_MAIL_FROM)
                .long(ARG_MAIL_FROM)
                .help("From header for reset mail")
                .env("TESSERA_MAIL_FROM")
                .default_value("Tessera <noreply@tessera.dev>"),
        )
        .arg(
            Arg::new(ARG_MAIL_SUBJECT)
                .long(ARG_MAIL_SUBJECT)
                .help("Subject line for reset mail")
                .env("TESSERA_MAIL_SUBJECT")
                .default_value("Reset your password"),
        )
}
