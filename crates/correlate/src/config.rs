//! Configuration file loading for the correlate tool.
//!
//! Settings come from `correlate.toml` in the current directory, or from a
//! file named on the command line. Every value has a default, so the file is
//! optional.

use engine_correlation::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// The file parsed but holds an unusable value.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Search settings for a correlation run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Search depth for every engine query. Defaults to 12.
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// First polling wait of a search in milliseconds. Defaults to 50.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

fn default_depth() -> u32 {
    12
}

fn default_wait_ms() -> u64 {
    50
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            wait_ms: default_wait_ms(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CorrelateConfig {
    /// How to find and set up the engine.
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl CorrelateConfig {
    /// Loads the configuration from disk.
    ///
    /// With an explicit `path` the file must exist. Without one, the default
    /// [`Self::config_path()`] is tried and a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// [`ConfigError::ParseError`] if the file contains invalid TOML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::read(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.engine.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Returns `correlate.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("correlate.toml")
    }
}
