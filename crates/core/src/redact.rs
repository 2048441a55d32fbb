//! Helpers enforcing the "never log user-supplied text" policy (spec.md §7).

use sha2::{Digest, Sha256};

/// A loggable fingerprint of user text: length in characters plus a short
/// hash prefix, never the text itself.
#[derive(Debug, Clone, Copy)]
pub struct TextFingerprint {
    pub chars: usize,
    pub hash_prefix: [u8; 4],
}

impl TextFingerprint {
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let mut hash_prefix = [0u8; 4];
        hash_prefix.copy_from_slice(&digest[..4]);
        Self {
            chars: text.chars().count(),
            hash_prefix,
        }
    }
}

impl std::fmt::Display for TextFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "chars={} sha256={:02x}{:02x}{:02x}{:02x}..",
            self.chars, self.hash_prefix[0], self.hash_prefix[1], self.hash_prefix[2], self.hash_prefix[3]
        )
    }
}
