use clap::{Arg, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STORE: &str = "store";
pub const ARG_PROFILE: &str = "profile";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the contest API, example: https://contest.tld/api")
                .env("CONTEST_ADMIN_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STORE)
                .long(ARG_STORE)
                .help("File holding the persisted session")
                .env("CONTEST_ADMIN_STORE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_PROFILE)
                .long(ARG_PROFILE)
                .help("API profile: admin or legacy (default: admin)")
                .env("CONTEST_ADMIN_PROFILE")
                .global(true)
                .value_parser(["admin", "legacy"]),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds, 0 disables it")
                .env("CONTEST_ADMIN_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
}
