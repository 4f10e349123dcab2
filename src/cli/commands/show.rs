//! Show configuration command.

use analytics_config::{to_toml, AppConfig};
use anyhow::Result;

pub fn run(config: &AppConfig) -> Result<()> {
    print!("{}", to_toml(config)?);
    Ok(())
}
