mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "watone", version, about = "Host and child tooling for watone window messaging")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
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
    fn parses_host_subcommand() {
        let cli = Cli::try_parse_from([
            "watone",
            "host",
            "/tmp/host.sock",
            "--user-id",
            "42",
            "--count",
            "3",
        ])
        .expect("host args should parse");

        match cli.command {
            Command::Host(args) => {
                assert_eq!(args.user_id, "42");
                assert_eq!(args.count, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "watone",
            "send-data",
            "/tmp/host.sock",
            "--json",
            "{\"x\":1}",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_login_info_with_timeout() {
        let cli = Cli::try_parse_from([
            "watone",
            "--format",
            "json",
            "login-info",
            "/tmp/host.sock",
            "--timeout",
            "500ms",
        ])
        .expect("login-info args should parse");
        assert!(matches!(cli.command, Command::LoginInfo(_)));
    }

    #[test]
    fn navigate_requires_url() {
        let err = Cli::try_parse_from(["watone", "navigate", "/tmp/host.sock"])
            .expect_err("missing url should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
