//! Configuration module for mailtag
//!
//! Engine settings live in `~/.config/mailtag/config.toml`. Every key is
//! optional; missing keys and a missing file fall back to the defaults.
//! Environment variables prefixed with `MAILTAG_` override file values.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::filters::TypeSelection;
use crate::stats::ListMode;

/// Messages touched by one tagging command below which `tagged` tags apply
pub const DEFAULT_BEHAVIOR_TRACKING_THRESHOLD: usize = 15;

/// Engine configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Tag commands touching fewer messages than this also apply every
    /// tag of type `tagged`
    pub behavior_tracking_threshold: usize,

    /// Filter types listed when a request names none (`any` for all)
    pub default_filter_types: Vec<String>,

    /// Leave `invisible` tags out of unfiltered listings
    pub hide_invisible: bool,

    pub default_list_mode: ListMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            behavior_tracking_threshold: DEFAULT_BEHAVIOR_TRACKING_THRESHOLD,
            default_filter_types: vec!["user".to_string()],
            hide_invisible: true,
            default_list_mode: ListMode::Default,
        }
    }
}

impl EngineConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("mailtag").join("config.toml"))
    }

    /// Load configuration from the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, using defaults if it does not exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or holds an unknown
    /// filter type.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Self::environment())
    }

    /// `MAILTAG_` variables; `default_filter_types` is comma separated
    fn environment() -> Environment {
        Environment::with_prefix("MAILTAG")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("default_filter_types")
    }

    fn load_with_env(path: &Path, environment: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment)
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every default filter type is known
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the bad type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        TypeSelection::parse(&self.default_filter_types)
            .map(|_| ())
            .map_err(|e| ConfigError::Message(format!("default_filter_types: {e}")))
    }

    /// Filter types selected by `default_filter_types`
    #[must_use]
    pub fn filter_types(&self) -> TypeSelection {
        TypeSelection::parse(&self.default_filter_types).unwrap_or_default()
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be determined or
    /// the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the parent directory cannot be created, the
    /// configuration cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
