//! TOML configuration loading with validation.
//!
//! Thin file-loading layer over the config types in
//! [`ballworks_common::config`]: read, parse, validate.

use std::io::ErrorKind;
use std::path::Path;

use ballworks_common::config::{ConfigError, SuperstructureConfig};

/// Load and validate the superstructure configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SuperstructureConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ConfigError::FileNotFound(path.display().to_string())
        } else {
            ConfigError::IoError(format!("failed to read {}: {e}", path.display()))
        }
    })?;
    load_config_from_str(&text)
}

/// Parse and validate a configuration from a TOML string (for testing).
pub fn load_config_from_str(toml_text: &str) -> Result<SuperstructureConfig, ConfigError> {
    let config: SuperstructureConfig =
        toml::from_str(toml_text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate().map_err(ConfigError::ValidationError)?;
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────
