//! Stock analytics CLI application.

mod cli;

use std::path::Path;

use analytics_monitor::setup_logging;
use anyhow::Result;
use clap::Parser;
use cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.command {
        Commands::ValidateConfig => return commands::validate::run(&cli.config),
        _ => commands::load(&cli.config)?,
    };

    // Setup logging
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.format == "json";
    let _log_guard = setup_logging(&level, json, config.logging.file.as_deref().map(Path::new));

    // Execute command
    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, config).await,
        Commands::Signals(args) => commands::signals::run(args, config).await,
        Commands::ShowConfig => commands::show::run(&config),
        Commands::ValidateConfig => commands::validate::run(&cli.config),
    }
}
