//! Configuration management using Figment
//!
//! Values are layered, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A TOML file, when present
//! 3. Environment variables prefixed `DATA_REPOSITORY_`, with `__` separating
//!    nested keys (`DATA_REPOSITORY_LOGGING__LEVEL=debug`)
//!
//! ```toml
//! [repository]
//! default_sort = ["id"]
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefix of the environment variables read by [`Config::load_from`]
pub const ENV_PREFIX: &str = "DATA_REPOSITORY_";

/// Default configuration file name used by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "data-repository.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Repository adaptor settings
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Repository adaptor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Sort fields used when a read names none
    #[serde(default = "default_sort")]
    pub default_sort: Vec<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_sort: default_sort(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `data_repository=debug`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_sort() -> Vec<String> {
    vec!["id".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from `./data-repository.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment variables
    /// still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::figment(path).extract()?;
        Ok(config)
    }

    /// The provider chain behind [`load_from`](Self::load_from)
    ///
    /// Callers can merge further providers before extracting.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        layered(path.as_ref(), ENV_PREFIX)
    }
}

fn layered(path: &Path, env_prefix: &str) -> Figment {
    if path.exists() {
        tracing::debug!("Loading configuration from: {}", path.display());
    }
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(env_prefix).split("__"))
}
