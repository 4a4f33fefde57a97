//! Content fingerprints for pinned snippets.
//!
//! A snippet that shows only part of a file is pinned to the exact file
//! contents it was written against. The pin is the first
//! [`SHORT_LEN`] hex characters of the SHA-256 of the whole, unmodified source
//! (the same short form `git` uses for commits, e.g. `8abb43d`).
//!
//! When the source changes, the pin stops matching and the build fails: line
//! numbers that used to point at a function may now point at a comment, and a
//! stale excerpt must never be published silently.
//!
//! Validation is a separate, synchronous step ([`validate`]) that runs before
//! any rendering, so a caller always knows whether the output can be trusted
//! before it has the output.

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Number of hex characters in a short fingerprint.
pub const SHORT_LEN: usize = 7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error(
        "Snippet selects lines but has no fingerprint; pin it with hash = \"{suggested}\""
    )]
    Missing { suggested: String },
    #[error(
        "Snippet fingerprint mismatch: pinned {expected}, source is now {actual} (sha256 {digest}); \
         the source file changed, re-check the selected lines and update the pin"
    )]
    Mismatch {
        expected: String,
        actual: String,
        digest: String,
    },
}

/// SHA-256 of a source text, kept as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    digest: String,
}

impl Fingerprint {
    /// Fingerprint the entire content, byte for byte.
    pub fn of(content: &str) -> Self {
        let digest = Sha256::digest(content.as_bytes());
        Self {
            digest: format!("{:x}", digest),
        }
    }

    /// Full 64-character hex digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Short 7-character prefix used as the pin.
    pub fn short(&self) -> &str {
        &self.digest[..SHORT_LEN]
    }

    /// Whether `pin` names this content. Surrounding whitespace is ignored.
    pub fn matches(&self, pin: &str) -> bool {
        pin.trim() == self.short()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

/// Check a pin against the content it claims to describe.
///
/// Returns the computed fingerprint on success. A missing pin is an error that
/// carries the correct value, so the author can paste it in.
pub fn validate(content: &str, expected: Option<&str>) -> Result<Fingerprint, FingerprintError> {
    let actual = Fingerprint::of(content);
    match expected {
        None => Err(FingerprintError::Missing {
            suggested: actual.short().to_string(),
        }),
        Some(pin) if actual.matches(pin) => Ok(actual),
        Some(pin) => Err(FingerprintError::Mismatch {
            expected: pin.trim().to_string(),
            actual: actual.short().to_string(),
            digest: actual.digest().to_string(),
        }),
    }
}
