//! Validate configuration command.

use anyhow::Result;
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match super::load(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Listen: {}:{}", config.server.host, config.server.port);
            println!("Provider: {}", config.upstream.provider);
            println!("Upstream gap: {}ms", config.upstream.min_gap_ms);
            println!("Cache entries: {}", config.cache.max_entries);
            println!(
                "Rate limit: {} requests / {}s",
                config.rate_limit.limit, config.rate_limit.window_secs
            );
            println!("Stream interval: {}s", config.stream.base_interval_secs);
        }
        Err(e) => {
            println!("Configuration error: {:#}", e);
            return Err(e);
        }
    }

    Ok(())
}
