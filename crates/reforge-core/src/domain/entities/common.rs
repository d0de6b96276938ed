use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest of some content, hex encoded.
///
/// Invariant: identical bytes always produce the identical hash, so two
/// artifacts (or two template bodies) with the same hash are the same content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash a piece of content.
    pub fn of(content: &str) -> Self {
        let digest = Sha256::digest(content.as_bytes());
        Self(hex::encode(digest))
    }

    /// Rehydrate a previously computed hash (from storage).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for logs.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Regeneration priority. 1 is the highest and is processed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const DEFAULT: Priority = Priority(3);

    /// Clamp to the valid range (1 or above).
    pub const fn new(value: u8) -> Self {
        if value == 0 { Self(1) } else { Self(value) }
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round to two decimals, the precision scores are reported at.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
