//! Sealed session tokens for the access cookie.
//!
//! A token is `base64url(nonce || AES-256-GCM(issued_at_be_u64))` under a key
//! derived with SHA-256 from a server-held secret and the master password.
//! Only the server can mint one, a fresh nonce makes every token distinct, and
//! the embedded issue time lets the server enforce a maximum age independent
//! of the cookie's `Max-Age`.  Changing either the secret or the password
//! invalidates every token minted before the change.

use std::time::Duration;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

use crate::gate::GateError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const PAYLOAD_LEN: usize = 8;

/// Mints and opens sealed session tokens.
#[derive(Clone)]
pub struct SessionSealer {
    key: [u8; 32],
}

impl std::fmt::Debug for SessionSealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSealer").finish_non_exhaustive()
    }
}

impl SessionSealer {
    /// Creates a sealer keyed by `SHA-256(secret || 0x00 || password)`.
    ///
    /// Tokens minted by this sealer stop opening once the password changes.
    pub fn bound_to(secret: &str, password: &str) -> Self {
        let digest = Sha256::new()
            .chain_update(secret.as_bytes())
            .chain_update([0u8])
            .chain_update(password.as_bytes())
            .finalize();

        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Seals `issued_at` (seconds since the Unix epoch) into a URL-safe token.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::TokenAuth`] if the AEAD implementation reports a
    /// failure.
    pub fn seal(&self, issued_at: u64) -> Result<String, GateError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), issued_at.to_be_bytes().as_slice())
            .map_err(|_| GateError::TokenAuth)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    /// Opens `token` and returns its issue time if it is younger than `max_age`
    /// at time `now`.
    ///
    /// Tokens stamped in the future (clock skew) count as age zero.
    ///
    /// # Errors
    ///
    /// - [`GateError::Base64`] / [`GateError::MalformedToken`] for bad encoding
    ///   or length.
    /// - [`GateError::TokenAuth`] for tampered tokens or a different secret.
    /// - [`GateError::TokenExpired`] for tokens older than `max_age`.
    pub fn open(&self, token: &str, now: u64, max_age: Duration) -> Result<u64, GateError> {
        let combined = URL_SAFE_NO_PAD.decode(token)?;
        if combined.len() != NONCE_LEN + PAYLOAD_LEN + TAG_LEN {
            return Err(GateError::MalformedToken);
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_LEN);
        let payload = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| GateError::TokenAuth)?;

        let stamp: [u8; PAYLOAD_LEN] = payload
            .as_slice()
            .try_into()
            .map_err(|_| GateError::MalformedToken)?;
        let issued_at = u64::from_be_bytes(stamp);

        let age_secs = now.saturating_sub(issued_at);
        let max_age_secs = max_age.as_secs();
        if age_secs > max_age_secs {
            return Err(GateError::TokenExpired {
                age_secs,
                max_age_secs,
            });
        }

        Ok(issued_at)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }
}

/// Generates a random 256-bit secret, hex encoded.
///
/// Used when the operator supplies no session secret; tokens then stop
/// opening after a restart.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
