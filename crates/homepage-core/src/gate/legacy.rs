//! Legacy password cipher (compatibility only).
//!
//! AES-128-CBC with PKCS#7 padding where **both** the key and the IV are the
//! UTF-8 bytes of [`to_fixed_length`]`(key_source)`.  Ciphertext travels as
//! standard Base64.
//!
//! Existing front ends encrypt the typed password with `key_source` set to the
//! password itself, so the server can check a submission by decrypting it
//! with key material derived from its own master password: a wrong password
//! yields a different key, and decryption either fails or produces a different
//! string.
//!
//! This is not a security control.  The output is a deterministic function of
//! the password, and anyone who captures it can replay it.  The access cookie
//! is therefore a sealed token (see [`crate::gate::token`]) unless the server
//! is explicitly run in [`GateMode::Legacy`](crate::gate::access::GateMode).

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::gate::fixed_length::{to_fixed_length, FIXED_LENGTH};
use crate::gate::GateError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Encrypts `plaintext` with key material derived from itself.
///
/// # Errors
///
/// Returns [`GateError::KeyLength`] when the derived key is not 16 bytes
/// (short inputs containing multi-byte characters).
pub fn encrypt(plaintext: &str) -> Result<String, GateError> {
    let key = derive_key(plaintext)?;
    let ciphertext = Aes128CbcEnc::new(&key.into(), &key.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypts a Base64 `ciphertext` with key material derived from `key_source`.
///
/// # Errors
///
/// - [`GateError::Base64`] if `ciphertext` is not Base64.
/// - [`GateError::KeyLength`] if the derived key is not 16 bytes.
/// - [`GateError::Padding`] if the length or padding is wrong (typically a
///   wrong key).
/// - [`GateError::Utf8`] if the plaintext is not UTF-8.
pub fn decrypt(ciphertext: &str, key_source: &str) -> Result<String, GateError> {
    let raw = STANDARD.decode(ciphertext.trim())?;
    let key = derive_key(key_source)?;
    let plaintext = Aes128CbcDec::new(&key.into(), &key.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&raw)
        .map_err(|_| GateError::Padding)?;
    Ok(String::from_utf8(plaintext)?)
}

fn derive_key(source: &str) -> Result<[u8; FIXED_LENGTH], GateError> {
    let fixed = to_fixed_length(source, FIXED_LENGTH);
    let actual = fixed.len();
    fixed
        .into_bytes()
        .try_into()
        .map_err(|_| GateError::KeyLength {
            expected: FIXED_LENGTH,
            actual,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
