use clap::{Arg, Command};

pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_REGISTER: &str = "register";
pub const CMD_STATUS: &str = "status";
pub const CMD_VERIFY: &str = "verify";
pub const CMD_REFRESH: &str = "refresh";
pub const CMD_NAVIGATE: &str = "navigate";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_PASSWORD_CONFIRM: &str = "password-confirm";
pub const ARG_FIRST_NAME: &str = "first-name";
pub const ARG_LAST_NAME: &str = "last-name";
pub const ARG_PATH: &str = "path";

fn email() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Administrator email")
        .env("CONTEST_ADMIN_EMAIL")
        .required(true)
}

fn password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long(ARG_PASSWORD)
        .help("Administrator password")
        .env("CONTEST_ADMIN_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn subcommands() -> Vec<Command> {
    vec![
        Command::new(CMD_LOGIN)
            .about("Sign in and persist the session")
            .arg(email())
            .arg(password()),
        Command::new(CMD_LOGOUT).about("Sign out and clear the persisted session"),
        Command::new(CMD_REGISTER)
            .about("Create an administrator account")
            .arg(
                Arg::new(ARG_FIRST_NAME)
                    .long(ARG_FIRST_NAME)
                    .help("First name")
                    .default_value(""),
            )
            .arg(
                Arg::new(ARG_LAST_NAME)
                    .long(ARG_LAST_NAME)
                    .help("Last name")
                    .default_value(""),
            )
            .arg(email())
            .arg(password())
            .arg(
                Arg::new(ARG_PASSWORD_CONFIRM)
                    .long(ARG_PASSWORD_CONFIRM)
                    .help("Password confirmation, must match --password")
                    .env("CONTEST_ADMIN_PASSWORD_CONFIRM")
                    .hide_env_values(true)
                    .required(true),
            ),
        Command::new(CMD_STATUS).about("Show the current session"),
        Command::new(CMD_VERIFY).about("Ask the server whether the session token is valid"),
        Command::new(CMD_REFRESH).about("Exchange the refresh token for a new token set"),
        Command::new(CMD_NAVIGATE)
            .about("Resolve a route and apply the access guard")
            .arg(
                Arg::new(ARG_PATH)
                    .help("Route path, example: /admin/dashboard")
                    .required(true),
            ),
    ]
}
