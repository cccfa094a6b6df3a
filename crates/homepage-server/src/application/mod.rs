//! Application layer for homepage-server.
//!
//! The application layer knows *what* each endpoint does, but delegates
//! *how* the document is stored to the infrastructure layer through the
//! [`ConfigRepository`] trait.
//!
//! # Responsibilities
//!
//! - Building the home view and the config page from the stored document
//! - Checking verification codes and issuing access tokens
//! - Validating and saving submitted documents
//! - Applying the route policy to gated paths
//!
//! # What does NOT belong here?
//!
//! - Parsing HTTP requests or writing headers (that is infrastructure)
//! - Opening files (the repository implementation does that)

pub mod repository;
pub mod site_service;

pub use repository::{ConfigRepository, StoreError};
pub use site_service::{unix_now, ServiceError, SiteService, VerifyOutcome};
