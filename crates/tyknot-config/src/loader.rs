//! Configuration Loader
//!
//! Finds `tyknot.toml` and applies environment overrides on top of it.

use crate::engine::{ConfigFile, EngineConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// File name searched for by [`ConfigLoader::load_from_directory`]
pub const CONFIG_FILE_NAME: &str = "tyknot.toml";

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Built-in defaults
/// 2. Nearest tyknot.toml
/// 3. Environment variables (TYKNOT_TRACE, TYKNOT_MAX_DEPTH)
#[derive(Debug, Default)]
pub struct ConfigLoader;

/// Loaded configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Effective engine settings
    pub engine: EngineConfig,

    /// File the settings were read from, if any
    pub source: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tyknot.toml. Falls back to the
    /// defaults when none exists.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (source, file) = self.find_config(start_dir)?;
        let engine = self.apply_env_overrides(file.engine_config())?;
        Ok(Config { engine, source })
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let file = ConfigFile::load_from_file(config_path)?;
        let engine = self.apply_env_overrides(file.engine_config())?;
        Ok(Config {
            engine,
            source: Some(config_path.to_path_buf()),
        })
    }

    fn find_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, ConfigFile)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let file = ConfigFile::load_from_file(&config_path)?;
                return Ok((Some(config_path), file));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ConfigFile::default())),
            }
        }
    }

    /// Environment variables follow the pattern TYKNOT_<KEY>
    fn apply_env_overrides(&self, mut config: EngineConfig) -> ConfigResult<EngineConfig> {
        if let Ok(trace) = env::var("TYKNOT_TRACE") {
            config.trace = matches!(trace.to_lowercase().as_str(), "true" | "1" | "yes");
        }

        if let Ok(depth) = env::var("TYKNOT_MAX_DEPTH") {
            let parsed = depth
                .parse::<usize>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "TYKNOT_MAX_DEPTH".to_string(),
                    reason: format!("expected a positive integer, got '{}'", depth),
                })?;
            config.max_depth = Some(parsed);
        }

        Ok(config)
    }
}

impl Config {
    /// Whether the settings came from a tyknot.toml
    pub fn has_file(&self) -> bool {
        self.source.is_some()
    }
}
