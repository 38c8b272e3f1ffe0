//! Configuration loading from the file system

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use super::types::ChooserConfig;
use crate::error::{ChooserError, Result, ResultExt};

/// `<config dir>/chooser/config.json`, e.g. `~/.config/chooser/config.json` on Linux.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Read and validate a config file.
pub fn load_config_from(path: &Path) -> Result<ChooserConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ChooserError::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    let config: ChooserConfig = serde_json::from_str(&raw)?;
    Ok(config.validated())
}

/// Load the config from the default location.
///
/// Returns `ChooserConfig::default()` if the file is missing or invalid.
#[instrument(name = "load_config")]
pub fn load_config() -> ChooserConfig {
    let path = default_config_path();

    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return ChooserConfig::default();
    }

    match load_config_from(&path).warn_on_err() {
        Some(config) => {
            info!(path = %path.display(), "Successfully loaded config");
            config
        }
        None => {
            warn!(path = %path.display(), "Failed to load config, using defaults");
            ChooserConfig::default()
        }
    }
}
