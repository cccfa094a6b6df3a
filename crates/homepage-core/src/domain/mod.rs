//! Domain entities for the homepage.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from OS APIs, network libraries, or the file system.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here that means the configuration document itself, and the transform that
//! turns a stored document into the shape a page renders.

/// The stored configuration document (`AppConfig`, `Site`, ...).
pub mod config;

/// Entrance-animation timing for rendered sections.
pub mod motion;

/// Stored document → render-ready `HomeView`.
///
/// See [`transform::transform`] for the main entry point.
pub mod transform;
