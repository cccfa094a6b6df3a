//! Password gate for the configuration editor.
//!
//! # How a visitor gets through
//!
//! ```text
//! browser                                   server
//!   │  types password P                        │
//!   │  checkCode = legacy::encrypt(P)          │
//!   │ ── POST /api/verify {checkCode} ───────► │ legacy::decrypt(checkCode, PASSWORD) == PASSWORD ?
//!   │ ◄──────── Set-Cookie: accessToken=T ──── │ T = AccessGate::issue_token(..)
//!   │ ── GET /config (Cookie: accessToken=T) ► │ RoutePolicy::decide(.., token_valid(T))
//! ```
//!
//! # Sub-modules
//!
//! - **`fixed_length`** – pads or hashes a string to exactly 16 characters.
//! - **`legacy`**       – the AES-128-CBC cipher existing front ends speak.
//!   Legacy-only: key and IV both come from the plaintext, so it is
//!   deterministic obfuscation, not authentication.
//! - **`token`**        – AES-256-GCM sealed session tokens keyed by a
//!   server-held secret.  Used for the access cookie by default.
//! - **`access`**       – [`access::AccessGate`], tying the above to the master
//!   password and the configured [`access::GateMode`].
//! - **`policy`**       – which paths are private and what happens to a
//!   request that arrives without a valid token.

use thiserror::Error;

pub mod access;
pub mod fixed_length;
pub mod legacy;
pub mod policy;
pub mod token;

/// Errors raised by the gate primitives.
///
/// None of these are surfaced to visitors in detail; the server maps every
/// variant to a plain "fail" response and logs the cause.
#[derive(Debug, Error)]
pub enum GateError {
    /// The payload was not valid Base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The derived key was not exactly 16 bytes.
    ///
    /// Happens for short passwords containing multi-byte characters: padding
    /// counts characters, the cipher counts bytes.
    #[error("derived key must be {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    /// CBC decryption produced invalid PKCS#7 padding (wrong key, or garbage).
    #[error("ciphertext padding is invalid")]
    Padding,

    /// The decrypted bytes were not UTF-8.
    #[error("decrypted payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The token had the wrong length or layout.
    #[error("session token is malformed")]
    MalformedToken,

    /// AEAD sealing or opening failed (tampered token, or wrong secret).
    #[error("session token failed authentication")]
    TokenAuth,

    /// The token is older than the allowed maximum age.
    #[error("session token expired {age_secs}s after issue (max {max_age_secs}s)")]
    TokenExpired { age_secs: u64, max_age_secs: u64 },
}
