//! Demo configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via ARCSTATE_CONFIG)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading the demo configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0:?}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config {0:?}: {1}")]
    Parse(PathBuf, String),
}

/// Demo configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Graph export configuration.
    pub graph: GraphConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("ARCSTATE_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.graph.apply_env_overrides();
    }
}

/// Graph export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Name of the emitted digraph.
    pub name: String,
    /// Whether to print the DOT rendering after the demo run.
    pub print_dot: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            name: "resource".to_string(),
            print_dot: true,
        }
    }
}

impl GraphConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(name) = std::env::var("ARCSTATE_GRAPH_NAME") {
            if !name.is_empty() {
                self.name = name;
            }
        }

        if let Ok(flag) = std::env::var("ARCSTATE_PRINT_DOT") {
            if let Ok(parsed) = flag.parse() {
                self.print_dot = parsed;
            }
        }
    }
}
