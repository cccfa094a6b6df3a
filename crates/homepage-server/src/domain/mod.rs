//! Domain layer for homepage-server.
//!
//! Pure types with no dependencies on sockets, files or the async runtime.
//!
//! # What belongs in the domain layer?
//!
//! - The server configuration structure
//! - The uniform `{data, message, success}` envelope and request bodies
//! - Page view models built on top of `homepage-core`
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `hyper` or `TcpStream` types
//! - File I/O or environment variable reading

pub mod config;
pub mod messages;

pub use config::ServerConfig;
pub use messages::{ApiResponse, ConfigPage, VerifyRequest};
