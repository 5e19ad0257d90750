//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KeelConfig;
use std::path::Path;

/// File name looked up in the project root.
pub const CONFIG_FILE: &str = "keel.toml";

/// Loads `<project_dir>/keel.toml`, falling back to defaults when the file
/// does not exist.
pub fn load_config(project_dir: &Path) -> Result<KeelConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Ok(KeelConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads a configuration from an explicit file path. The file must exist.
pub fn load_config_file(path: &Path) -> Result<KeelConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<KeelConfig, ConfigError> {
    let config: KeelConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &KeelConfig) -> Result<(), ConfigError> {
    if config.toolchain.go.is_empty() {
        return Err(ConfigError::MissingField("toolchain.go".to_string()));
    }
    if config.lint.tool.is_empty() {
        return Err(ConfigError::MissingField("lint.tool".to_string()));
    }
    if config.lint.ignore_suffixes.iter().any(String::is_empty) {
        return Err(ConfigError::ValidationError(
            "lint.ignore_suffixes must not contain empty entries".to_string(),
        ));
    }
    Ok(())
}
