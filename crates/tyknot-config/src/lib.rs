//! tyknot configuration
//!
//! Loads the resolution engine settings from `tyknot.toml`.
//!
//! # Configuration Hierarchy
//!
//! Settings are merged in the following order (later overrides earlier):
//! 1. Built-in defaults ([`EngineConfig::default`])
//! 2. Project config (nearest `tyknot.toml` walking up from a directory)
//! 3. Environment variables (`TYKNOT_*`)
//!
//! # Example
//!
//! ```no_run
//! use tyknot_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! assert_eq!(config.engine.placeholder, "Recursive");
//! ```

pub mod engine;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use engine::{ConfigFile, EngineConfig, EngineSection};
pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
