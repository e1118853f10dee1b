use crate::cli::actions::{
    session::{Args, Command},
    Action,
};
use crate::cli::commands::{
    client::{ARG_API_URL, ARG_PROFILE, ARG_STORE, ARG_TIMEOUT},
    session::{
        ARG_EMAIL, ARG_FIRST_NAME, ARG_LAST_NAME, ARG_PASSWORD, ARG_PASSWORD_CONFIRM, ARG_PATH,
        CMD_LOGIN, CMD_LOGOUT, CMD_NAVIGATE, CMD_REFRESH, CMD_REGISTER, CMD_STATUS, CMD_VERIFY,
    },
};
use crate::config::{AppConfig, ConfigOverrides};
use crate::session::ApiProfile;
use anyhow::{anyhow, bail, Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let config = config(matches)?;

    let command = match matches.subcommand() {
        Some((CMD_LOGIN, sub_m)) => Command::Login {
            email: string(sub_m, ARG_EMAIL)?,
            password: secret(sub_m, ARG_PASSWORD)?,
        },
        Some((CMD_LOGOUT, _)) => Command::Logout,
        Some((CMD_REGISTER, sub_m)) => Command::Register {
            first_name: sub_m
                .get_one::<String>(ARG_FIRST_NAME)
                .cloned()
                .unwrap_or_default(),
            last_name: sub_m
                .get_one::<String>(ARG_LAST_NAME)
                .cloned()
                .unwrap_or_default(),
            email: string(sub_m, ARG_EMAIL)?,
            password: secret(sub_m, ARG_PASSWORD)?,
            password_confirm: secret(sub_m, ARG_PASSWORD_CONFIRM)?,
        },
        Some((CMD_STATUS, _)) => Command::Status,
        Some((CMD_VERIFY, _)) => Command::Verify,
        Some((CMD_REFRESH, _)) => Command::Refresh,
        Some((CMD_NAVIGATE, sub_m)) => Command::Navigate {
            path: string(sub_m, ARG_PATH)?,
        },
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("missing command"),
    };

    Ok(Action::Session(Args { config, command }))
}

fn config(matches: &clap::ArgMatches) -> Result<AppConfig> {
    let profile = matches
        .get_one::<String>(ARG_PROFILE)
        .map(|value| value.parse::<ApiProfile>())
        .transpose()
        .map_err(|err| anyhow!(err))?;

    Ok(AppConfig::load(ConfigOverrides::new(
        matches.get_one::<String>(ARG_API_URL).map(String::as_str),
        matches.get_one::<String>(ARG_STORE).map(String::as_str),
        profile,
        matches.get_one::<u64>(ARG_TIMEOUT).copied(),
    )))
}

fn string(matches: &clap::ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn secret(matches: &clap::ArgMatches, id: &str) -> Result<SecretString> {
    string(matches, id).map(SecretString::from)
}
