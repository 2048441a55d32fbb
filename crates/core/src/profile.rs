//! Static per-backend capability records.

use crate::voice::BackendKind;
use serde::{Deserialize, Serialize};

/// Immutable capability record for one backend kind.
///
/// Invariant: `optimal_words <= max_words` and
/// `crossfade_ms * 2 < minimum_chunk_audio_duration_ms` (enforced by
/// [`BackendProfile::validate`], called when the static table is built).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BackendProfile {
    pub kind: BackendKind,
    /// Hard ceiling; a chunk over this word count is rejected outright.
    pub max_words: usize,
    /// Hard ceiling on character count.
    pub max_chars: usize,
    /// Soft target the chunker packs toward.
    pub optimal_words: usize,
    /// Whether text must be split before this backend is called at all.
    pub needs_chunking: bool,
    /// Crossfade width used when stitching this backend's chunk output.
    pub crossfade_ms: u32,
    /// Native output sample rate in Hz.
    pub native_sample_rate: u32,
    /// Maximum number of concurrent in-flight requests this backend tolerates.
    pub max_concurrency: usize,
    /// Per-call timeout, defaults to 60s per SPEC_FULL.md §5.
    pub timeout_secs: u64,
}

impl BackendProfile {
    pub fn validate(&self) -> Result<(), String> {
        if self.optimal_words > self.max_words {
            return Err(format!(
                "{}: optimal_words ({}) must not exceed max_words ({})",
                self.kind, self.optimal_words, self.max_words
            ));
        }
        // A crossfade needs at least 4x its own width of audio per side to
        // avoid degenerate overlap; approximate the minimum chunk duration
        // from optimal_words at a conservative 2 words/sec speaking rate.
        let min_chunk_ms = (self.optimal_words as f64 / 2.0) * 1000.0;
        if (self.crossfade_ms as f64) * 2.0 >= min_chunk_ms {
            return Err(format!(
                "{}: crossfade_ms ({}) too wide for optimal_words ({})",
                self.kind, self.crossfade_ms, self.optimal_words
            ));
        }
        Ok(())
    }
}

/// Default profile table, grounded on spec.md §3's typical 40-200 word
/// generation ceilings and §8's scenario constants (neural profile
/// `optimal_words=150`).
pub fn default_profiles() -> Vec<BackendProfile> {
    vec![
        BackendProfile {
            kind: BackendKind::NeuralRest,
            max_words: 200,
            max_chars: 1400,
            optimal_words: 150,
            needs_chunking: true,
            crossfade_ms: 30,
            native_sample_rate: 24_000,
            max_concurrency: 8,
            timeout_secs: 60,
        },
        BackendProfile {
            kind: BackendKind::VoiceCloneMultipart,
            max_words: 80,
            max_chars: 600,
            optimal_words: 60,
            needs_chunking: true,
            crossfade_ms: 40,
            native_sample_rate: 22_050,
            max_concurrency: 2,
            timeout_secs: 90,
        },
        BackendProfile {
            kind: BackendKind::SessionChannel,
            max_words: 120,
            max_chars: 900,
            optimal_words: 90,
            needs_chunking: true,
            crossfade_ms: 25,
            native_sample_rate: 22_050,
            max_concurrency: 4,
            timeout_secs: 60,
        },
        BackendProfile {
            kind: BackendKind::EmotionWebSocket,
            max_words: 60,
            max_chars: 450,
            optimal_words: 45,
            needs_chunking: true,
            crossfade_ms: 50,
            native_sample_rate: 44_100,
            max_concurrency: 3,
            timeout_secs: 60,
        },
        BackendProfile {
            kind: BackendKind::CloudApiKey,
            max_words: 4096 / 5, // vendor char cap translated to a word ceiling
            max_chars: 4096,
            optimal_words: 400,
            needs_chunking: false,
            crossfade_ms: 20,
            native_sample_rate: 24_000,
            max_concurrency: 16,
            timeout_secs: 30,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profiles_are_internally_consistent() {
        for profile in default_profiles() {
            profile
                .validate()
                .unwrap_or_else(|e| panic!("invalid profile: {e}"));
        }
    }
}
