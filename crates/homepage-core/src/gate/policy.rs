//! Route policy: which paths are private and what happens at the gate.
//!
//! ```text
//!             path matches a private prefix?
//!               │ no                 │ yes
//!            Public               Gated ── valid token? ── yes ─► Pass
//!               │                                │ no
//!             Pass              password configured? ── no ─► RedirectHome
//!                                                │ yes
//!                                  API path? ── yes ─► Deny
//!                                                │ no
//!                                        RewriteToVerify
//! ```

/// Name of the cookie holding the access token.
pub const ACCESS_COOKIE: &str = "accessToken";

/// Where page requests are rewritten when the gate stays closed.
pub const VERIFY_PATH: &str = "/config";
pub const VERIFY_QUERY: &str = "verify";

/// Paths guarded by default: the editor page and the config write/download APIs.
pub const DEFAULT_PRIVATE_PREFIXES: &[&str] = &["/config", "/api/config", "/api/file"];

const API_PREFIX: &str = "/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Gated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Serve the request as asked.
    Pass,
    /// No master password is configured; send the visitor home.
    RedirectHome,
    /// Serve the verification view instead of the requested page.
    RewriteToVerify,
    /// Refuse an API call with 401.
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    private_prefixes: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PRIVATE_PREFIXES.iter().copied())
    }
}

impl RoutePolicy {
    /// Builds a policy from prefixes.  Trailing slashes are ignored.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let private_prefixes = prefixes
            .into_iter()
            .map(|p| {
                let p = p.as_ref().trim_end_matches('/');
                if p.is_empty() {
                    "/".to_string()
                } else {
                    p.to_string()
                }
            })
            .collect();
        Self { private_prefixes }
    }

    pub fn private_prefixes(&self) -> &[String] {
        &self.private_prefixes
    }

    /// A path is gated when it equals a prefix or continues it with `/`.
    pub fn classify(&self, path: &str) -> RouteClass {
        let gated = self
            .private_prefixes
            .iter()
            .any(|prefix| prefix_matches(prefix, path));

        if gated {
            RouteClass::Gated
        } else {
            RouteClass::Public
        }
    }

    /// Decides what to do with a request for `path`.
    pub fn decide(&self, path: &str, password_configured: bool, token_valid: bool) -> GateDecision {
        if self.classify(path) == RouteClass::Public || token_valid {
            return GateDecision::Pass;
        }

        if !password_configured {
            GateDecision::RedirectHome
        } else if prefix_matches(API_PREFIX, path) {
            GateDecision::Deny
        } else {
            GateDecision::RewriteToVerify
        }
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
