//! The access gate: master password plus token policy.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::gate::legacy;
use crate::gate::token::SessionSealer;
use crate::gate::GateError;

/// How long an access cookie stays valid (14 days).
pub const ACCESS_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 14);

/// What the access cookie carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// A server-sealed, time-stamped token.
    #[default]
    Sealed,
    /// The raw legacy ciphertext of the password, compared byte-for-byte
    /// against `legacy::encrypt(master_password)`.  Replayable; kept only for
    /// deployments whose front ends read the cookie themselves.
    Legacy,
}

#[derive(Debug, Error)]
#[error("unknown gate mode '{0}' (expected 'sealed' or 'legacy')")]
pub struct ParseGateModeError(String);

impl FromStr for GateMode {
    type Err = ParseGateModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sealed" => Ok(GateMode::Sealed),
            "legacy" => Ok(GateMode::Legacy),
            _ => Err(ParseGateModeError(s.to_string())),
        }
    }
}

impl std::fmt::Display for GateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateMode::Sealed => f.write_str("sealed"),
            GateMode::Legacy => f.write_str("legacy"),
        }
    }
}

/// Checks submitted passwords and issues/validates access tokens.
#[derive(Clone)]
pub struct AccessGate {
    password: Option<String>,
    mode: GateMode,
    sealer: SessionSealer,
    max_age: Duration,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("configured", &self.is_configured())
            .field("mode", &self.mode)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    /// Creates a gate.  An empty `password` counts as not configured.
    ///
    /// Sealed tokens are keyed by both `session_secret` and the password, so
    /// a password change locks out every cookie issued before it.
    pub fn new(password: Option<String>, mode: GateMode, session_secret: &str) -> Self {
        let password = password.filter(|p| !p.is_empty());
        let sealer = SessionSealer::bound_to(session_secret, password.as_deref().unwrap_or(""));
        Self {
            password,
            mode,
            sealer,
            max_age: ACCESS_MAX_AGE,
        }
    }

    /// Overrides the token lifetime.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// `true` when a master password is set.  Without one the gate never opens.
    pub fn is_configured(&self) -> bool {
        self.password.is_some()
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Checks a `checkCode` submitted by the verification form.
    ///
    /// The code must decrypt, under key material derived from the master
    /// password, to the master password itself.
    pub fn check_code_matches(&self, check_code: &str) -> bool {
        let Some(password) = self.password.as_deref() else {
            return false;
        };

        match legacy::decrypt(check_code, password) {
            Ok(plaintext) => plaintext == password,
            Err(e) => {
                debug!("check code rejected: {e}");
                false
            }
        }
    }

    /// Issues the cookie value for a visitor whose `check_code` was accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if sealing fails.
    pub fn issue_token(&self, check_code: &str, now: u64) -> Result<String, GateError> {
        match self.mode {
            GateMode::Sealed => self.sealer.seal(now),
            GateMode::Legacy => Ok(check_code.to_owned()),
        }
    }

    /// Validates a cookie value presented with a gated request.
    pub fn token_is_valid(&self, token: &str, now: u64) -> bool {
        let Some(password) = self.password.as_deref() else {
            return false;
        };

        match self.mode {
            GateMode::Sealed => match self.sealer.open(token, now, self.max_age) {
                Ok(_) => true,
                Err(e) => {
                    debug!("access token rejected: {e}");
                    false
                }
            },
            GateMode::Legacy => match legacy::encrypt(password) {
                Ok(expected) => expected == token,
                Err(e) => {
                    debug!("cannot derive legacy token for master password: {e}");
                    false
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
