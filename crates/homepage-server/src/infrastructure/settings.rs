//! Optional TOML settings file for the server.
//!
//! Every key is optional; anything left out falls back to the CLI flag, its
//! environment variable, or the built-in default (in that order).
//!
//! ```toml
//! bind = "127.0.0.1"
//! port = 8080
//! config_dir = "/var/lib/homepage"
//! config_file = "config.json"
//! gate_mode = "sealed"
//! strict_config = false
//! private_prefixes = ["/config", "/api/config", "/api/file"]
//! ```
//!
//! The master password and session secret are never read from
//! this file; pass them through the environment.

use std::path::{Path, PathBuf};

use homepage_core::GateMode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub config_dir: Option<PathBuf>,
    pub config_file: Option<String>,
    pub gate_mode: Option<GateMode>,
    pub strict_config: Option<bool>,
    pub private_prefixes: Option<Vec<String>>,
}

impl ServerSettings {
    /// Parses settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }
}

/// Reads and parses the settings file at `path`.
pub fn load_settings(path: &Path) -> Result<ServerSettings, SettingsError> {
    debug!("loading settings from {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ServerSettings::from_toml(&text)
}
