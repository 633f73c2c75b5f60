//! One-way secret hashing used before any secret reaches persistence.

use base64::prelude::*;
use sha2::{Digest, Sha256};

/// One-way transform from a plaintext secret to a storable digest
pub trait SecretHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> String;
}

/// SHA-256 hasher producing the base64 digest format shared with the
/// protocol engine's secret validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256SecretHasher;

impl SecretHasher for Sha256SecretHasher {
    fn hash(&self, plaintext: &str) -> String {
        let digest = Sha256::digest(plaintext.as_bytes());
        BASE64_STANDARD.encode(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_not_plaintext() {
        let hasher = Sha256SecretHasher;
        let digest = hasher.hash("s3cret");
        assert_ne!(digest, "s3cret");
        assert!(!digest.is_empty());
    }

    #[test]
    fn test_digest_is_deterministic() {
        let hasher = Sha256SecretHasher;
        assert_eq!(hasher.hash("s3cret"), hasher.hash("s3cret"));
        assert_ne!(hasher.hash("s3cret"), hasher.hash("s3cret2"));
    }
}
