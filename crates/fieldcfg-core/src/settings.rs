//! Engine settings read from a small TOML file.
//!
//! ```toml
//! config_dir = "./config"
//! log_level = "debug"
//! discover = ["AudioConfig", "NetworkConfig"]
//! ```
//!
//! Every key is optional.  A missing settings file is not an error: the
//! engine runs with [`RegistrySettings::default`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SettingsError;

/// Settings for a [`crate::ConfigRegistry`] and the process hosting it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Directory config files are read from and written to.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Config type identifiers to register during the standard phase.
    #[serde(default)]
    pub discover: Vec<String>,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("./config")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            log_level: default_log_level(),
            discover: Vec::new(),
        }
    }
}

impl RegistrySettings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] if the TOML is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads settings from `path`, returning the defaults if the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] for file-system errors other than "not
    /// found", and [`SettingsError::Parse`] if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
