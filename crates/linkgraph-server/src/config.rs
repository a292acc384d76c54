//! Configuration management for the linkgraph service.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! # Configuration Hierarchy
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use linkgraph_server::config::ServerConfig;
//!
//! // Load from file with env overrides
//! let config = ServerConfig::load("linkgraph.yaml")?;
//!
//! // Or load from environment only
//! let config = ServerConfig::from_env()?;
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use linkgraph_domain::LoaderConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "LINKGRAPH";
const VALID_BACKENDS: [&str; 1] = ["memory"];
const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Batched loading settings
    #[serde(default)]
    pub loader: LoaderSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Storage backend settings.
///
/// # Example YAML Configuration
///
/// ```yaml
/// storage:
///   backend: memory
///   seed_demo_data: true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Storage backend type. Only "memory" is available.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Load the demo social graph at startup.
    /// Environment variable: `LINKGRAPH_STORAGE__SEED_DEMO_DATA`
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            seed_demo_data: true,
        }
    }
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

fn default_true() -> bool {
    true
}

/// Batched loading settings, applied to every resolution pass.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoaderSettings {
    /// Memoise loaded values for the rest of the pass.
    /// Environment variable: `LINKGRAPH_LOADER__CACHE_ENABLED`
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
        }
    }
}

impl From<&LoaderSettings> for LoaderConfig {
    fn from(settings: &LoaderSettings) -> Self {
        LoaderConfig::default().with_cache_enabled(settings.cache_enabled)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `LINKGRAPH_` and use `__` as separator.
    /// For example:
    /// - `LINKGRAPH_LOGGING__LEVEL=debug` overrides `logging.level`
    /// - `LINKGRAPH_LOADER__CACHE_ENABLED=false` overrides `loader.cache_enabled`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if !VALID_BACKENDS.contains(&self.storage.backend.as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "storage.backend must be one of: {:?}, got: {}",
                    VALID_BACKENDS, self.storage.backend
                ),
            });
        }

        if !VALID_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    VALID_LEVELS, self.logging.level
                ),
            });
        }

        Ok(())
    }
}

// `__` separates nested keys: LINKGRAPH_STORAGE__BACKEND -> storage.backend
fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
