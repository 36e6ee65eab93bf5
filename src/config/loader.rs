//! Configuration loading from disk.
//!
//! Command-line overrides are applied before validation; the merged config
//! is what gets checked.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::HostConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "IO error reading {}: {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut HostConfig) {
        if let Some(bind) = &self.bind_address {
            config.listener.bind_address = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<HostConfig, ConfigError> {
    parse_config_with(content, &ConfigOverrides::default())
}

/// Parse TOML text, apply `overrides`, then validate the result as a whole.
pub fn parse_config_with(
    content: &str,
    overrides: &ConfigOverrides,
) -> Result<HostConfig, ConfigError> {
    let config: HostConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    finish(config, overrides)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    parse_config(&read(path)?)
}

/// Build the startup configuration: the file at `path` (or defaults), with
/// `overrides` applied, validated once as a whole.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<HostConfig, ConfigError> {
    match path {
        Some(path) => parse_config_with(&read(path)?, overrides),
        None => finish(HostConfig::default(), overrides),
    }
}

fn finish(mut config: HostConfig, overrides: &ConfigOverrides) -> Result<HostConfig, ConfigError> {
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
