//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It is built from CLI arguments, environment variables and an optional TOML
//! settings file in `main.rs`, or from defaults in tests.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads inside the domain) makes the server easy to embed in tests.

use std::net::SocketAddr;
use std::path::PathBuf;

use homepage_core::gate::policy::DEFAULT_PRIVATE_PREFIXES;
use homepage_core::gate::token::generate_secret;
use homepage_core::GateMode;

/// Default file name of the homepage document inside the config directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// All runtime configuration for the homepage server.
///
/// # Example
///
/// ```rust
/// use homepage_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 3000);
/// assert!(cfg.config_path().ends_with("config.json"));
/// ```
#[derive(Clone)]
pub struct ServerConfig {
    /// Address and port the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Directory holding the homepage document.
    pub config_dir: PathBuf,

    /// File name of the homepage document inside `config_dir`.
    pub config_file: String,

    /// Master password for the config editor.  `None` keeps the editor closed:
    /// gated pages redirect home.
    pub password: Option<String>,

    /// What the access cookie carries.
    pub gate_mode: GateMode,

    /// Secret keying sealed access tokens.
    pub session_secret: String,

    /// When `true`, a missing document is an error instead of falling back to
    /// the built-in default.
    pub strict_config: bool,

    /// Path prefixes guarded by the gate.
    pub private_prefixes: Vec<String>,
}

impl ServerConfig {
    /// Full path of the homepage document.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(&self.config_file)
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("config_dir", &self.config_dir)
            .field("config_file", &self.config_file)
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .field("gate_mode", &self.gate_mode)
            .field("strict_config", &self.strict_config)
            .field("private_prefixes", &self.private_prefixes)
            .finish_non_exhaustive()
    }
}

impl Default for ServerConfig {
    /// Returns a `ServerConfig` suitable for local development.
    ///
    /// | Field            | Default                                 |
    /// |------------------|-----------------------------------------|
    /// | bind_addr        | `0.0.0.0:3000`                          |
    /// | config_dir       | `config`                                |
    /// | config_file      | `config.json`                           |
    /// | password         | none                                    |
    /// | gate_mode        | `sealed`                                |
    /// | session_secret   | random per process                      |
    /// | strict_config    | `false`                                 |
    /// | private_prefixes | `/config`, `/api/config`, `/api/file`   |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            config_dir: PathBuf::from("config"),
            config_file: DEFAULT_CONFIG_FILE.to_string(),
            password: None,
            gate_mode: GateMode::Sealed,
            session_secret: generate_secret(),
            strict_config: false,
            private_prefixes: DEFAULT_PRIVATE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
