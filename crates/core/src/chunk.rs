//! A text segment sized to fit within a backend's generation ceiling.

use serde::{Deserialize, Serialize};

/// One chunk produced by the chunker.
///
/// Invariant: concatenating chunk texts with single-space joins yields a
/// string semantically equivalent (modulo whitespace) to the normalized
/// input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub is_terminal: bool,
}

impl Chunk {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
