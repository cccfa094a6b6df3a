//! Infrastructure layer for homepage-server.
//!
//! The infrastructure layer handles all I/O: accepting HTTP connections,
//! reading and writing the configuration file, and parsing headers.
//!
//! # Responsibilities
//!
//! - Binding the TCP listener and serving HTTP/1 connections with hyper
//! - Routing requests to the application use cases
//! - Reading and writing `config.json` ([`store::FileConfigStore`])
//! - Parsing `Cookie` headers and building `Set-Cookie` values
//! - Loading the optional TOML settings file
//! - Handling the graceful shutdown signal
//!
//! # What does NOT belong here?
//!
//! - Gate decisions and document validation (that is the application layer)
//! - Message type definitions (that is the domain layer)
//! - Command-line parsing (that is done in `main.rs`)

pub mod cookies;
pub mod http_server;
pub mod settings;
pub mod store;

pub use http_server::{route, run_server, serve};
pub use settings::{load_settings, ServerSettings, SettingsError};
pub use store::FileConfigStore;
