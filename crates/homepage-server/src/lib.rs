//! homepage-server library crate.
//!
//! This crate serves the Remio homepage: it loads the JSON configuration
//! document on every request, hands out the render-ready view, and guards the
//! configuration editor behind the password gate.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (JSON over HTTP)
//!         ↕
//! [homepage-server]
//!   ├── domain/           Pure types: ServerConfig, API envelope, page views
//!   ├── application/      Use cases: home view, config page, verify, save, download
//!   └── infrastructure/
//!         ├── http_server/ hyper accept loop + router
//!         ├── store/       config.json on disk
//!         ├── cookies/     Cookie / Set-Cookie headers
//!         └── settings/    optional TOML settings file
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `homepage-core`; it reaches the
//!   file system only through the [`application::ConfigRepository`] trait.
//! - `infrastructure` depends on all other layers plus `tokio` and `hyper`.

/// Domain layer: configuration and message types (no I/O).
pub mod domain;

/// Application layer: request use cases.
pub mod application;

/// Infrastructure layer: HTTP server, file store, settings file.
pub mod infrastructure;
