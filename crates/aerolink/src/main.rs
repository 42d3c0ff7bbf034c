mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "aerolink", version, about = "Telemetry protocol diagnostics CLI")]
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
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from(["aerolink", "decode", "capture.bin", "--limit", "5"])
            .expect("decode args should parse");
        assert!(matches!(cli.command, Command::Decode(_)));
    }

    #[test]
    fn parses_hex_flag() {
        let cli = Cli::try_parse_from(["aerolink", "decode", "capture.txt", "--hex"])
            .expect("hex flag should parse");
        let Command::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        assert!(args.hex);
    }

    #[test]
    fn parses_info_subcommand() {
        let cli = Cli::try_parse_from(["aerolink", "info", "--format", "json"])
            .expect("info args should parse");
        assert!(matches!(cli.command, Command::Info(_)));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["aerolink", "frobnicate"]).is_err());
    }
}
