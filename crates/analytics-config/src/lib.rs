//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, CacheSettings, LoggingConfig, MarketSettings, RateLimitSettings,
    ServerSettings, StreamSettings, UpstreamSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;

/// Environment variable prefix, e.g. `ANALYTICS__SERVER__PORT`.
pub const ENV_PREFIX: &str = "ANALYTICS";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Load configuration from an optional file and the environment, then validate it.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, SettingsError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("market.indices")
                .with_list_parse_key("market.mega_cap")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = config.try_deserialize()?;
    config.validate().map_err(SettingsError::Invalid)?;
    Ok(config)
}

/// Render the effective configuration as TOML.
pub fn to_toml(config: &AppConfig) -> Result<String, SettingsError> {
    Ok(toml::to_string_pretty(config)?)
}
