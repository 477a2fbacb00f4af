//! Configuration loader with environment variable support

use super::Config;
use crate::error::Result;
use config::{Environment, File};
use std::path::Path;

/// Prefix for environment overrides, e.g. `COURSE_GENERATOR__GEMINI__MODEL`
const ENV_PREFIX: &str = "COURSE_GENERATOR";

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    Ok(cfg)
}

/// Load configuration from a TOML file with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    Ok(cfg)
}
