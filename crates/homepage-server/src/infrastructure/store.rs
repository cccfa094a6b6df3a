//! File-backed [`ConfigRepository`].
//!
//! The document lives at `<config_dir>/<config_file>`.  It is read from disk
//! on every call (no cache), so edits made by hand show up on the next
//! request.  Writes replace the file wholesale; concurrent writers race and
//! the last one wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use homepage_core::AppConfig;
use tracing::{debug, info};

use crate::application::{ConfigRepository, StoreError};
use crate::domain::ServerConfig;

/// Reads and writes the homepage document on the local file system.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    strict: bool,
}

impl FileConfigStore {
    /// Creates a store for `dir/file_name`.
    ///
    /// With `strict` set, a missing file is [`StoreError::NotFound`];
    /// otherwise the built-in document is served in its place.
    pub fn new(dir: impl AsRef<Path>, file_name: &str, strict: bool) -> Self {
        Self {
            path: dir.as_ref().join(file_name),
            strict,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.config_dir, &config.config_file, config.strict_config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        debug!("reading configuration from {}", self.path.display());

        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.strict {
                    Err(StoreError::NotFound {
                        path: self.path.clone(),
                    })
                } else {
                    debug!("{} not found; using built-in document", self.path.display());
                    Ok(None)
                }
            }
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl ConfigRepository for FileConfigStore {
    fn load(&self) -> Result<AppConfig, StoreError> {
        match self.read()? {
            Some(contents) => serde_json::from_str(&contents).map_err(StoreError::Parse),
            None => Ok(AppConfig::builtin()),
        }
    }

    fn load_raw(&self) -> Result<String, StoreError> {
        match self.read()? {
            Some(contents) => Ok(contents),
            None => serde_json::to_string_pretty(&AppConfig::builtin())
                .map_err(StoreError::Serialize),
        }
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        std::fs::write(&self.path, contents).map_err(io_err)?;

        info!("wrote configuration to {}", self.path.display());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
