mod credentials;
mod types;

pub use credentials::Credentials;
pub use types::*;

use crate::Result;
use std::{env, io::ErrorKind, path::Path};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Loads configuration from `CONFIG_PATH`, or `config.yaml` in the working
/// directory. Only the default file may be absent, in which case built-in
/// defaults are used.
pub async fn load() -> Result<Config> {
    match env::var("CONFIG_PATH") {
        Ok(config_path) => load_from(&config_path).await,
        Err(_) => match load_from(DEFAULT_CONFIG_PATH).await {
            Err(crate::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                Ok(Config::default())
            }
            other => other,
        },
    }
}

pub async fn load_from(config_path: impl AsRef<Path>) -> Result<Config> {
    let config_path = config_path.as_ref();
    debug!("Loading configuration from: {}", config_path.display());

    let config_str = tokio::fs::read_to_string(config_path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;
    config.validate()?;

    Ok(config)
}
