//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file (`config.toml` in the platform config directory, or the
//!    file given with `--config`)
//! 3. Environment variables prefixed with `DIRDEDUPE_`
//!    (e.g. `DIRDEDUPE_WORKERS=8`)
//! 4. Command-line flags
//!
//! # Example file
//!
//! ```toml
//! workers = 4
//! algorithm = "sha256"
//! follow_symlinks = false
//! ignore_patterns = ["*.tmp", ".git/"]
//! delete_mode = "trash"
//! cache = "/var/tmp/dirdedupe-cache.json"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::DeleteMode;
use crate::duplicates::default_workers;
use crate::scanner::HashAlgorithm;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DIRDEDUPE_";

/// Errors raised while assembling the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has the wrong shape.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// `workers` was zero.
    #[error("workers must be at least 1")]
    InvalidWorkers,

    /// The configuration could not be rendered as TOML.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Effective application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of hashing workers.
    pub workers: usize,
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Gitignore-style patterns excluded from both trees.
    pub ignore_patterns: Vec<String>,
    /// How duplicates are removed.
    pub delete_mode: DeleteMode,
    /// Result cache file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            algorithm: HashAlgorithm::default(),
            follow_symlinks: false,
            ignore_patterns: Vec::new(),
            delete_mode: DeleteMode::default(),
            cache: None,
        }
    }
}

/// Values supplied on the command line; unset fields leave lower layers
/// untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<HashAlgorithm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_symlinks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_mode: Option<DeleteMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default file, the environment and
    /// `overrides`.
    ///
    /// If `explicit` is given, that file must exist and replaces the default
    /// location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer is malformed or the result is
    /// invalid.
    pub fn load(explicit: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path(),
        };
        Self::figment(file.as_deref(), overrides)
            .extract::<Self>()
            .map_err(ConfigError::from)?
            .validated()
    }

    /// Build the layered provider chain.
    #[must_use]
    pub fn figment(file: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(self)
    }

    /// Render as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Default platform-specific configuration file location.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dirdedupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
