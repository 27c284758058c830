mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "quotanl", version, about = "Linux disk quota notification CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). RUST_LOG takes precedence when set.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_subcommand() {
        let cli = Cli::try_parse_from([
            "quotanl",
            "watch",
            "--count",
            "3",
            "--timeout",
            "500ms",
            "--group",
            "events",
        ])
        .expect("watch args should parse");

        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.count, Some(3));
                assert_eq!(args.timeout.as_deref(), Some("500ms"));
                assert_eq!(args.group, "events");
                assert_eq!(args.family, "VFS_DQUOT");
            }
            other => panic!("expected watch, got {other:?}"),
        }
    }

    #[test]
    fn parses_family_with_default_name() {
        let cli = Cli::try_parse_from(["quotanl", "family"]).expect("family args should parse");
        match cli.command {
            Command::Family(args) => assert_eq!(args.name, "VFS_DQUOT"),
            other => panic!("expected family, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["quotanl", "family", "nlctrl", "--format", "json"])
            .expect("global flags should parse after the subcommand");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }

    #[test]
    fn rejects_zero_count() {
        let err = Cli::try_parse_from(["quotanl", "watch", "--count", "0"])
            .expect_err("zero count should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn requires_subcommand() {
        let err = Cli::try_parse_from(["quotanl"]).expect_err("missing subcommand should fail");
        assert!(matches!(
            err.kind(),
            clap::error::ErrorKind::MissingSubcommand
                | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        ));
    }
}
