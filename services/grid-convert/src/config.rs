//! Converter configuration.

use std::path::Path;

use anyhow::{Context, Result};
use grid_common::ConversionConfig;

/// Load settings from a YAML file, or from the environment when no file is given.
///
/// Keys missing from the file keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<ConversionConfig> {
    let config = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_yaml::from_str::<ConversionConfig>(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => ConversionConfig::from_env(),
    };

    config.validate()?;
    Ok(config)
}
