//! Storage seam for the homepage document.
//!
//! The application layer never opens files itself.  It talks to a
//! [`ConfigRepository`], which the infrastructure layer implements on top of
//! the file system (see `infrastructure::store`) and tests replace with a
//! `mockall` mock.

use std::path::PathBuf;

use homepage_core::AppConfig;
use thiserror::Error;

/// Errors raised while reading or writing the homepage document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist and no fallback applies.
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Reading or writing the document failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document exists but is not a valid JSON configuration.
    #[error("invalid configuration document: {0}")]
    Parse(#[source] serde_json::Error),

    /// The document could not be serialised for writing.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Read/write access to the single homepage document.
///
/// Implementations read fresh on every call; there is no cache.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigRepository: Send + Sync {
    /// Loads and parses the document.
    fn load(&self) -> Result<AppConfig, StoreError>;

    /// Loads the document as stored, without parsing.
    fn load_raw(&self) -> Result<String, StoreError>;

    /// Replaces the document wholesale with `contents`.
    fn save(&self, contents: &str) -> Result<(), StoreError>;
}
