//! Course Generator Server Binary
//!
//! Loads configuration, wires the Gemini, YouTube and Unsplash clients and
//! serves the HTTP API until Ctrl+C or SIGTERM.

use course_generator::{
    config::Config,
    observability::init_observability,
    server::{build_state, create_app, serve},
};
use std::path::Path;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let dotenv = dotenvy::dotenv();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        Config::from_file_with_env(&config_path)?
    } else {
        let config = Config::default_config();
        config.validate()?;
        config
    };

    init_observability(&config.logging.level, &config.logging.format);

    info!("Starting Course Generator Server");
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
    if config_found {
        info!("Configuration loaded and validated from {}", config_path);
    } else {
        warn!("{} not found, using defaults and environment variables", config_path);
    }

    let state = build_state(&config)?;
    let app = create_app(&config, state);

    serve(&config, app).await
}
