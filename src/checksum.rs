//! Checksum utilities for generated modules

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum of emitted text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum of a rendered module
    pub fn of(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for report lines
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        *self == Self::of(content)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = "module.exports = mongoose.model('Books', booksSchema);\n";
        assert_eq!(Checksum::of(content), Checksum::of(content));
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(Checksum::of("a"), Checksum::of("b"));
    }

    #[test]
    fn test_checksum_verification() {
        let content = "const mongoose = require('mongoose');\n";
        let checksum = Checksum::of(content);
        assert!(checksum.verify(content));
        assert!(!checksum.verify("different content"));
        assert_eq!(checksum.short().len(), 12);
    }
}
