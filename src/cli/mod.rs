//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stock-analytics")]
#[command(author, version, about = "Rate-limit safe stock analytics API")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level (overrides the configured one)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP and WebSocket API
    Serve(ServeArgs),
    /// Print the signal report of one symbol
    Signals(SignalsArgs),
    /// Validate configuration
    ValidateConfig,
    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Bind address (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Serve CSV files from this directory instead of the upstream API
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct SignalsArgs {
    /// Symbol to evaluate
    pub symbol: String,

    /// Lookback period
    #[arg(long, default_value = "1mo")]
    pub period: String,

    /// Bar interval
    #[arg(short, long, default_value = "1d")]
    pub interval: String,

    /// Read CSV files from this directory instead of the upstream API
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["stock-analytics", "-l", "debug", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.log_level, Some(LogLevel::Debug)));
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(9000));
                assert!(args.host.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_signals_defaults() {
        let cli = Cli::try_parse_from(["stock-analytics", "signals", "aapl"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
        match cli.command {
            Commands::Signals(args) => {
                assert_eq!(args.symbol, "aapl");
                assert_eq!(args.period, "1mo");
                assert_eq!(args.interval, "1d");
                assert_eq!(args.output, "text");
            }
            _ => panic!("expected signals"),
        }
    }
}
