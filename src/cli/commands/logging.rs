//! The `-v` flag. Each occurrence raises the log level one step; the env var
//! takes either a level name or the step number.

use clap::{builder::ValueParser, Arg, ArgAction, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ENV_LOG_LEVEL: &str = "CONTEST_ADMIN_LOG_LEVEL";

/// Levels in verbosity order; the index is the `-v` count.
const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

/// Highest numeric verbosity accepted from the environment.
const MAX_VERBOSITY: u8 = 5;

fn parse_verbosity(value: &str) -> Result<u8, String> {
    let value = value.trim();
    if let Ok(step) = value.parse::<u8>() {
        return if step <= MAX_VERBOSITY {
            Ok(step)
        } else {
            Err(format!("verbosity must be at most {MAX_VERBOSITY}"))
        };
    }

    LEVELS
        .iter()
        .position(|level| level.as_str().eq_ignore_ascii_case(value))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("unknown log level '{value}'"))
}

#[must_use]
pub fn verbosity_parser() -> ValueParser {
    ValueParser::from(parse_verbosity)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Raise log verbosity: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env(ENV_LOG_LEVEL)
            .global(true)
            .action(ArgAction::Count)
            .value_parser(verbosity_parser()),
    )
}

/// Maps the verbosity count to a tracing level, saturating at `TRACE`.
#[must_use]
pub fn level(verbosity: u8) -> Level {
    LEVELS
        .get(usize::from(verbosity))
        .copied()
        .unwrap_or(Level::TRACE)
}
