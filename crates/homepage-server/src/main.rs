//! Remio homepage server: entry point.
//!
//! This binary serves the render-ready view of a single JSON homepage
//! configuration document and guards the configuration editor and its write
//! APIs behind a password gate.
//!
//! # Usage
//!
//! ```text
//! homepage-server [OPTIONS]
//!
//! Options:
//!   --settings       <FILE>  Optional TOML settings file
//!   --bind           <IP>    Address to bind [default: 0.0.0.0]
//!   --port           <PORT>  HTTP port [default: 3000]
//!   --config-dir     <DIR>   Directory holding the document [default: ./config]
//!   --config-file    <NAME>  Document file name [default: config.json]
//!   --password       <PW>    Master password (gate closed when unset)
//!   --gate-mode      <MODE>  sealed | legacy [default: sealed]
//!   --session-secret <KEY>   Secret for sealed tokens [default: random]
//!   --strict-config          Fail instead of serving defaults when the document is missing
//! ```
//!
//! # Environment variable overrides
//!
//! Every flag can also be set through the environment.  Precedence is
//! CLI flag, then environment variable, then settings file, then default.
//!
//! | Variable            | Flag               |
//! |---------------------|--------------------|
//! | `HOMEPAGE_SETTINGS` | `--settings`       |
//! | `HOMEPAGE_BIND`     | `--bind`           |
//! | `HOMEPAGE_PORT`     | `--port`           |
//! | `CONFIG_DIR`        | `--config-dir`     |
//! | `CONFIG_FILE`       | `--config-file`    |
//! | `PASSWORD`          | `--password`       |
//! | `GATE_MODE`         | `--gate-mode`      |
//! | `SESSION_SECRET`    | `--session-secret` |
//! | `STRICT_CONFIG`     | `--strict-config`  |
//!
//! Log verbosity is controlled with `RUST_LOG` (default `info`).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use homepage_core::GateMode;
use homepage_server::domain::ServerConfig;
use homepage_server::infrastructure::{load_settings, run_server, ServerSettings};

const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remio homepage server.
///
/// Values left unset fall back to the settings file, then to built-in
/// defaults, which is why most fields are `Option`s.
#[derive(Debug, Default, Parser)]
#[command(
    name = "homepage-server",
    about = "Serves the Remio homepage config view and password-gated editor API",
    version
)]
struct Cli {
    /// Optional TOML settings file.
    #[arg(long, env = "HOMEPAGE_SETTINGS")]
    settings: Option<PathBuf>,

    /// IP address to bind.  `0.0.0.0` accepts connections on every interface.
    #[arg(long, env = "HOMEPAGE_BIND")]
    bind: Option<String>,

    /// TCP port for the HTTP server.
    #[arg(long, env = "HOMEPAGE_PORT")]
    port: Option<u16>,

    /// Directory holding the homepage document.
    #[arg(long, env = "CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// File name of the homepage document.
    #[arg(long, env = "CONFIG_FILE")]
    config_file: Option<String>,

    /// Master password for the configuration editor.
    ///
    /// Without it the editor stays closed and gated pages redirect home.
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// What the access cookie carries: `sealed` (server-sealed token) or
    /// `legacy` (the submitted ciphertext, for old front ends).
    #[arg(long, env = "GATE_MODE")]
    gate_mode: Option<GateMode>,

    /// Secret keying sealed access tokens.  A random secret is generated per
    /// process when unset, so tokens do not survive a restart.
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    /// Fail requests when the document is missing instead of serving the
    /// built-in default.
    #[arg(long, env = "STRICT_CONFIG")]
    strict_config: bool,
}

impl Cli {
    /// Reads the settings file (if any) and builds a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed, or if
    /// the bind address is invalid.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let settings = match &self.settings {
            Some(path) => load_settings(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => ServerSettings::default(),
        };
        self.merge(settings)
    }

    /// Combines CLI values with `settings`; CLI values win.
    fn merge(self, settings: ServerSettings) -> anyhow::Result<ServerConfig> {
        let defaults = ServerConfig::default();

        let bind = self
            .bind
            .or(settings.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let port = self.port.or(settings.port).unwrap_or(DEFAULT_PORT);
        let ip: IpAddr = bind
            .trim()
            .parse()
            .with_context(|| format!("invalid bind address: '{bind}'"))?;
        let bind_addr = SocketAddr::new(ip, port);

        let session_secret = match self.session_secret.filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("SESSION_SECRET not set; access tokens will not survive a restart");
                defaults.session_secret
            }
        };

        Ok(ServerConfig {
            bind_addr,
            config_dir: self
                .config_dir
                .or(settings.config_dir)
                .unwrap_or(defaults.config_dir),
            config_file: self
                .config_file
                .or(settings.config_file)
                .unwrap_or(defaults.config_file),
            password: self.password.filter(|p| !p.is_empty()),
            gate_mode: self
                .gate_mode
                .or(settings.gate_mode)
                .unwrap_or(defaults.gate_mode),
            session_secret,
            strict_config: self.strict_config || settings.strict_config.unwrap_or(false),
            private_prefixes: settings
                .private_prefixes
                .unwrap_or(defaults.private_prefixes),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; `RUST_LOG` sets the level.
/// 2. CLI arguments (and their environment fallbacks) are parsed with `clap`.
/// 3. A [`ServerConfig`] is built, reading the settings file if given.
/// 4. A Ctrl+C handler clears the shared `running` flag.
/// 5. [`run_server`] serves requests until the flag is cleared.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = Cli::parse().into_server_config()?;

    info!("homepage server starting ({:?})", config);
    if config.password.is_none() {
        warn!("PASSWORD not set; the configuration editor is disabled");
    }

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── Main server loop ──────────────────────────────────────────────────────
    run_server(config, running).await?;

    info!("homepage server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_port_override() {
        // Arrange: override --port
        let cli = Cli::parse_from(["homepage-server", "--port", "9999"]);

        // Assert
        assert_eq!(cli.port, Some(9999));
    }

    #[test]
    fn test_cli_gate_mode_parses_legacy() {
        let cli = Cli::parse_from(["homepage-server", "--gate-mode", "legacy"]);
        assert_eq!(cli.gate_mode, Some(GateMode::Legacy));
    }

    #[test]
    fn test_cli_rejects_unknown_gate_mode() {
        let result = Cli::try_parse_from(["homepage-server", "--gate-mode", "open"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_strict_config_flag() {
        let cli = Cli::parse_from(["homepage-server", "--strict-config"]);
        assert!(cli.strict_config);
    }

    #[test]
    fn test_merge_without_values_uses_defaults() {
        // Arrange: nothing set anywhere
        let cli = Cli::default();

        // Act
        let config = cli.merge(ServerSettings::default()).unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.config_path(), PathBuf::from("config").join("config.json"));
        assert_eq!(config.gate_mode, GateMode::Sealed);
        assert!(config.password.is_none());
        assert!(!config.strict_config);
        assert!(!config.session_secret.is_empty());
    }

    #[test]
    fn test_merge_settings_fill_unset_cli_values() {
        let settings = ServerSettings {
            bind: Some("127.0.0.1".to_string()),
            port: Some(8080),
            gate_mode: Some(GateMode::Legacy),
            strict_config: Some(true),
            private_prefixes: Some(vec!["/admin".to_string()]),
            ..ServerSettings::default()
        };

        let config = Cli::default().merge(settings).unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.gate_mode, GateMode::Legacy);
        assert!(config.strict_config);
        assert_eq!(config.private_prefixes, vec!["/admin".to_string()]);
    }

    #[test]
    fn test_merge_cli_values_win_over_settings() {
        let cli = Cli {
            port: Some(4000),
            config_file: Some("cli.json".to_string()),
            ..Cli::default()
        };
        let settings = ServerSettings {
            port: Some(8080),
            config_file: Some("settings.json".to_string()),
            ..ServerSettings::default()
        };

        let config = cli.merge(settings).unwrap();

        assert_eq!(config.bind_addr.port(), 4000);
        assert_eq!(config.config_file, "cli.json");
    }

    #[test]
    fn test_merge_empty_password_counts_as_unset() {
        let cli = Cli {
            password: Some(String::new()),
            ..Cli::default()
        };

        let config = cli.merge(ServerSettings::default()).unwrap();

        assert!(config.password.is_none());
    }

    #[test]
    fn test_merge_keeps_explicit_session_secret() {
        let cli = Cli {
            session_secret: Some("fixed-secret".to_string()),
            ..Cli::default()
        };

        let config = cli.merge(ServerSettings::default()).unwrap();

        assert_eq!(config.session_secret, "fixed-secret");
    }

    #[test]
    fn test_merge_accepts_ipv6_bind() {
        // Arrange: unspecified IPv6 address, as passed with `--bind ::`
        let cli = Cli::parse_from(["homepage-server", "--bind", "::"]);

        // Act
        let config = cli.merge(ServerSettings::default()).unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "[::]:3000");
    }

    #[test]
    fn test_merge_ipv6_loopback_from_settings_with_port() {
        let settings = ServerSettings {
            bind: Some("::1".to_string()),
            port: Some(8080),
            ..ServerSettings::default()
        };

        let config = Cli::default().merge(settings).unwrap();

        assert_eq!(config.bind_addr.to_string(), "[::1]:8080");
    }

    #[test]
    fn test_merge_rejects_bind_with_embedded_port() {
        let cli = Cli {
            bind: Some("127.0.0.1:80".to_string()),
            ..Cli::default()
        };

        assert!(cli.merge(ServerSettings::default()).is_err());
    }

    #[test]
    fn test_merge_invalid_bind_returns_error() {
        // Arrange: provide an invalid IP address string
        let cli = Cli {
            bind: Some("not.an.ip".to_string()),
            ..Cli::default()
        };

        // Act
        let result = cli.merge(ServerSettings::default());

        // Assert: must return an error, not panic
        assert!(result.is_err());
    }

    #[test]
    fn test_into_server_config_missing_settings_file_returns_error() {
        let cli = Cli {
            settings: Some(PathBuf::from("/nonexistent/homepage-settings.toml")),
            ..Cli::default()
        };

        assert!(cli.into_server_config().is_err());
    }
}
