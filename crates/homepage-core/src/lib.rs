//! # homepage-core
//!
//! Shared library for the Remio homepage containing the configuration model,
//! the render-ready view transform, and the access gate primitives that guard
//! the configuration editor.
//!
//! It has zero dependencies on network sockets, async runtimes, or the file
//! system; the server crate owns all I/O.
//!
//! # Architecture overview (for beginners)
//!
//! The homepage is driven by a single JSON document (`AppConfig`): the site
//! grid, social links, backgrounds, layout options and footer.  A front end
//! renders whatever the server hands it, so the interesting work happens
//! before rendering:
//!
//! - **`domain`** – The configuration document and the pure transform that
//!   reshapes it into a `HomeView`: which sites go into the static grid and
//!   which overflow into the modal, which background images to use, which
//!   primary colour to apply, and how entrance animations are timed.
//!
//! - **`gate`** – The password gate for the `/config` editor: the
//!   fixed-length key derivation, the legacy AES-CBC cipher that existing front
//!   ends speak, a sealed session token for the access cookie, and the route
//!   policy that decides whether a request passes, is rewritten to the
//!   verification view, or is refused.

pub mod domain;
pub mod gate;

// Re-export the most-used types at the crate root so callers can write
// `homepage_core::AppConfig` instead of `homepage_core::domain::config::AppConfig`.
pub use domain::config::{AppConfig, BgConfig, BgSource, Site};
pub use domain::transform::{transform, HomeView};
pub use gate::access::{AccessGate, GateMode};
pub use gate::policy::{GateDecision, RouteClass, RoutePolicy};
pub use gate::GateError;
