//! Engine settings (`[engine]` table of tyknot.toml)

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default constructor name of the recursive-placeholder goal
pub const DEFAULT_PLACEHOLDER: &str = "Recursive";

/// On-disk layout of tyknot.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Resolution engine settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineSection>,
}

/// `[engine]` table; every key is optional
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Emit search progress events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,

    /// Abort the search once rule applications nest deeper than this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Type constructor wrapped around a goal to request its deferred cell
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Effective engine settings after defaults and overrides are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub trace: bool,
    pub max_depth: Option<usize>,
    pub placeholder: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trace: true,
            max_depth: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Settings with tracing switched off
    pub fn quiet() -> Self {
        Self {
            trace: false,
            ..Self::default()
        }
    }

    /// Overlay the values present in `section`
    pub fn apply(&mut self, section: &EngineSection) {
        if let Some(trace) = section.trace {
            self.trace = trace;
        }
        if let Some(max_depth) = section.max_depth {
            self.max_depth = Some(max_depth);
        }
        if let Some(placeholder) = &section.placeholder {
            self.placeholder = placeholder.clone();
        }
    }
}

impl ConfigFile {
    /// Load a config file from disk
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::parse(&content).map_err(|e| match e {
            ParseFailure::Toml(error) => ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error,
            },
            ParseFailure::Invalid(e) => e,
        })
    }

    /// Parse config text that did not come from a file
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content).map_err(|e| match e {
            ParseFailure::Toml(error) => ConfigError::TomlParseError {
                file: "<inline>".into(),
                error,
            },
            ParseFailure::Invalid(e) => e,
        })
    }

    fn parse(content: &str) -> Result<Self, ParseFailure> {
        let config: Self = toml::from_str(content).map_err(ParseFailure::Toml)?;
        config.validate().map_err(ParseFailure::Invalid)?;
        Ok(config)
    }

    /// Validate the values that TOML typing cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        let Some(engine) = &self.engine else {
            return Ok(());
        };

        if engine.max_depth == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "engine.max_depth".to_string(),
                reason: "depth limit must be at least 1".to_string(),
            });
        }

        if let Some(placeholder) = &engine.placeholder {
            if !is_valid_constructor(placeholder) {
                return Err(ConfigError::InvalidValue {
                    field: "engine.placeholder".to_string(),
                    reason: format!("'{}' is not a type constructor name", placeholder),
                });
            }
        }

        Ok(())
    }

    /// Effective engine settings for this file
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(section) = &self.engine {
            config.apply(section);
        }
        config
    }
}

enum ParseFailure {
    Toml(toml::de::Error),
    Invalid(ConfigError),
}

/// Constructor names start with an uppercase letter; lowercase names are
/// type variables.
fn is_valid_constructor(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
