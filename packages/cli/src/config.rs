//! `wildsafe.toml` configuration.
//!
//! Every key is optional. Command-line flags override file values, and
//! API keys only ever come from the environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use wildsafe_intel::dashboard::DEFAULT_LOCATION;
use wildsafe_intel_models::{InvalidCapabilityError, ThemeMode, UserCapability};

/// Config file looked up in the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "wildsafe.toml";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] InvalidCapabilityError),
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Location searched on startup.
    pub location: String,
    /// Initial theme. `FIRE` turns on fire-mode.
    pub theme: ThemeMode,
    /// Whether to look up the device position by IP on startup.
    pub geolocate: bool,
    /// The user's capability profile.
    pub profile: ProfileConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            theme: ThemeMode::default(),
            geolocate: true,
            profile: ProfileConfig::default(),
        }
    }
}

/// `[profile]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    pub experience: u8,
    pub fitness: u8,
    pub pack_weight_kg: f64,
    pub group_size: u32,
    pub start_time: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let UserCapability {
            experience,
            fitness,
            pack_weight_kg,
            group_size,
            start_time,
        } = UserCapability::default();
        Self {
            experience,
            fitness,
            pack_weight_kg,
            group_size,
            start_time,
        }
    }
}

impl From<ProfileConfig> for UserCapability {
    fn from(value: ProfileConfig) -> Self {
        Self {
            experience: value.experience,
            fitness: value.fitness,
            pack_weight_kg: value.pack_weight_kg,
            group_size: value.group_size,
            start_time: value.start_time,
        }
    }
}

impl Config {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] if the document does not match the schema
    /// * [`ConfigError::Invalid`] if a profile value is out of range
    pub fn from_toml(path: &Path, toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.user().validate()?;
        Ok(config)
    }

    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] if it exists, or defaults.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if an explicitly requested file cannot be read
    /// * [`ConfigError::Parse`] / [`ConfigError::Invalid`] as for
    ///   [`Self::from_toml`]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found; using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let toml_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());

        Self::from_toml(&path, &toml_str)
    }

    /// The profile as a [`UserCapability`].
    #[must_use]
    pub fn user(&self) -> UserCapability {
        self.profile.clone().into()
    }
}
