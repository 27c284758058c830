use clap::{Args, Subcommand};
use quotanl_client::{FAMILY_NAME, GROUP_NAME};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod family;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Join the quota events group and print notifications.
    Watch(WatchArgs),
    /// Resolve a generic netlink family and print its multicast groups.
    Family(FamilyArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, format),
        Command::Family(args) => family::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Exit after printing N notifications.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
    /// Give up when no notification arrives within this long (e.g. 30s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
    /// Generic netlink family name.
    #[arg(long, env = "QUOTANL_FAMILY", default_value = FAMILY_NAME)]
    pub family: String,
    /// Multicast group name.
    #[arg(long, env = "QUOTANL_GROUP", default_value = GROUP_NAME)]
    pub group: String,
}

#[derive(Args, Debug)]
pub struct FamilyArgs {
    /// Family name to resolve.
    #[arg(default_value = FAMILY_NAME)]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<std::time::Duration> {
    use std::time::Duration;

    use crate::exit::{CliError, USAGE};

    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
