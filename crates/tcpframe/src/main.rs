mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "tcpframe", version, about = "Length-prefixed TCP message framing CLI")]
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
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "tcpframe",
            "send",
            "127.0.0.1:7400",
            "--data",
            "hello",
        ])
        .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "tcpframe",
            "send",
            "127.0.0.1:7400",
            "--data",
            "hello",
            "--file",
            "payload.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_listen_subcommand() {
        let cli = Cli::try_parse_from([
            "tcpframe",
            "listen",
            "127.0.0.1:0",
            "--count",
            "3",
            "--deadline",
            "2s",
        ])
        .expect("listen args should parse");
        assert!(matches!(cli.command, Command::Listen(_)));
    }

    #[test]
    fn parses_echo_subcommand_with_workers() {
        let cli = Cli::try_parse_from(["tcpframe", "echo", "127.0.0.1:0", "--workers", "8"])
            .expect("echo args should parse");
        assert!(matches!(cli.command, Command::Echo(_)));
    }

    #[test]
    fn rejects_malformed_address() {
        let err = Cli::try_parse_from(["tcpframe", "listen", "not-an-addr"])
            .expect_err("bad addr should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
