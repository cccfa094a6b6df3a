//! Fixed-length key material.
//!
//! The legacy cipher needs exactly 16 bytes of key and IV.  Passwords are
//! brought to that length like this:
//!
//! | Input length (chars) | Output                                    |
//! |----------------------|-------------------------------------------|
//! | `== 16`              | the input, unchanged                      |
//! | `< 16`               | the input right-padded with `'i'`         |
//! | `> 16`               | first 16 lowercase hex chars of its MD5   |

use md5::{Digest, Md5};

/// Key/IV length of the legacy cipher, in characters.
pub const FIXED_LENGTH: usize = 16;

/// Filler appended to short inputs.
pub const FILLER: char = 'i';

/// Brings `input` to exactly `length` characters.
///
/// Lengths are counted in `char`s.  For `length > 32` the hashed branch is
/// limited by the 32 hex characters an MD5 digest has.
pub fn to_fixed_length(input: &str, length: usize) -> String {
    let count = input.chars().count();

    if count == length {
        return input.to_owned();
    }

    if count < length {
        let mut padded = String::with_capacity(input.len() + (length - count));
        padded.push_str(input);
        padded.extend(std::iter::repeat(FILLER).take(length - count));
        padded
    } else {
        let mut digest = hex::encode(Md5::digest(input.as_bytes()));
        digest.truncate(length);
        digest
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
