//! # Runtime Configuration Module
//!
//! Environment variables that locate the on-disk inputs of a gatehouse
//! deployment. Values that influence individual requests live in the
//! [`ConfigStore`](crate::config::ConfigStore) instead.
//!
//! ## Environment Variables
//!
//! ### `GATEHOUSE_CONFIG`
//!
//! Path of the YAML configuration file. Default: `config/config.yaml`.
//!
//! ### `GATEHOUSE_TEMPLATE_DIR`
//!
//! Root directory that holds `<controller>/<handler>.html` templates.
//! Default: `templates`.
//!
//! ### `GATEHOUSE_WATCH_CONFIG`
//!
//! `true` to reload the configuration file whenever it changes. Default: `false`.
//!
//! ## Usage
//!
//! ```rust
//! use gatehouse::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Templates: {}", config.template_dir.display());
//! ```

use std::env;
use std::path::PathBuf;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
/// Default template root
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// YAML configuration file
    pub config_path: PathBuf,
    /// Template root directory
    pub template_dir: PathBuf,
    /// Reload the configuration file on change
    pub watch_config: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            watch_config: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();
        RuntimeConfig {
            config_path: lookup("GATEHOUSE_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            template_dir: lookup("GATEHOUSE_TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            watch_config: lookup("GATEHOUSE_WATCH_CONFIG")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.watch_config),
        }
    }
}
