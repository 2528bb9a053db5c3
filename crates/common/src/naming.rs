//! Area and user identifier helpers.
//!
//! Area and user names double as path components in the directory store, so
//! every name that arrives from a client must pass [`is_name_safe`] before it
//! is joined onto a storage root. Generated names come from
//! [`random_identifier`], which only emits characters from [`NAME_ALPHABET`].

use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

/// URL- and path-safe alphabet for generated identifiers (base62).
pub const NAME_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Upper bound on accepted names, in bytes.
pub const MAX_NAME_LENGTH: usize = 64;

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above this are rejected so every character is equally likely.
const REJECTION_LIMIT: u8 = 248;

#[derive(Debug, Error)]
pub enum NamingError {
    #[error("Random source failed")]
    RandomSource,

    #[error("Invalid identifier length: {0}")]
    InvalidLength(usize),
}

/// Generate a random identifier of `len` characters from [`NAME_ALPHABET`].
///
/// Uses the system CSPRNG. No uniqueness check is made; callers rely on the
/// size of the identifier space.
///
/// # Errors
///
/// Returns [`NamingError::InvalidLength`] if `len` is zero or above
/// [`MAX_NAME_LENGTH`], and [`NamingError::RandomSource`] if the CSPRNG fails.
pub fn random_identifier(len: usize) -> Result<String, NamingError> {
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(NamingError::InvalidLength(len));
    }

    let rng = SystemRandom::new();
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 32];

    while out.len() < len {
        rng.fill(&mut buf).map_err(|_| NamingError::RandomSource)?;
        for &b in &buf {
            if b >= REJECTION_LIMIT {
                continue;
            }
            if let Some(&c) = NAME_ALPHABET.get(usize::from(b) % NAME_ALPHABET.len()) {
                out.push(char::from(c));
            }
            if out.len() == len {
                break;
            }
        }
    }

    Ok(out)
}

/// Check that `name` cannot escape the directory it is joined onto.
///
/// Rejects empty and overlong names, `.`/`..`, any `..` sequence, path
/// separators, NUL and other control characters.
#[must_use]
pub fn is_name_safe(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return false;
    }

    if name == "." || name.contains("..") {
        return false;
    }

    !name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
}
