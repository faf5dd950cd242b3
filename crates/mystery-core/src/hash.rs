//! Fingerprints of generated images

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// SHA-256 of the PNG bytes written for an asset.
///
/// Displays as the first 16 hex digits, which is what batch summaries print.
#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Hash an image already on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(Self::from_bytes(&std::fs::read(path)?))
    }

    /// All 64 lowercase hex digits
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_hex()[..16])
    }
}
