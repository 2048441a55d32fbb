//! The uniform synthesis contract exposed to the pipeline.
//!
//! Shape grounded on the teacher's `TextToSpeech`/`LlmBackend` traits: one
//! async method per capability, `Send + Sync + 'static` so adapters can be
//! held behind `Arc<dyn SynthesisAdapter>` in the router's adapter map.

use crate::audio::AudioBuffer;
use crate::error::GatewayError;
use crate::voice::{BackendKind, Voice};
use async_trait::async_trait;


/// Advisory output-format hint passed to `synthesize`.
///
/// The pipeline passes `Wav` when it intends to stitch multiple chunks,
/// and the caller's requested format when there is exactly one chunk.
/// Adapters that cannot honor the hint return their native format; the
/// stitcher/transcoder absorbs the mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    Wav,
    Mp3,
    Flac,
    Opus,
}

impl FormatHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatHint::Wav => "wav",
            FormatHint::Mp3 => "mp3",
            FormatHint::Flac => "flac",
            FormatHint::Opus => "opus",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Some(FormatHint::Wav),
            "mp3" => Some(FormatHint::Mp3),
            "flac" => Some(FormatHint::Flac),
            "opus" => Some(FormatHint::Opus),
            _ => None,
        }
    }
}

/// Result of a successful adapter call: decoded audio plus whether it
/// already matches the requested container (enables the single-chunk
/// short-circuit in spec.md §4.6).
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub audio: AudioBuffer,
    /// Raw encoded bytes in whatever container the adapter actually
    /// produced. Present so the short-circuit path can pass them through
    /// byte-for-byte instead of re-encoding.
    pub raw_bytes: Vec<u8>,
    pub raw_format: FormatHint,
}

/// One adapter per upstream backend kind, speaking that backend's wire
/// protocol and exposing this single uniform contract to the pipeline.
#[async_trait]
pub trait SynthesisAdapter: Send + Sync + 'static {
    /// Tag identifying which [`BackendProfile`](crate::profile::BackendProfile)
    /// governs this adapter's chunking and concurrency limits.
    fn kind(&self) -> BackendKind;

    /// Synthesize `text` with `voice`, honoring `format_hint` when possible.
    ///
    /// `speed` is advisory; adapters that cannot honor it ignore it
    /// (documented per-adapter per SPEC_FULL.md §9's resolved Open
    /// Question).
    async fn synthesize(
        &self,
        text: &str,
        voice: &Voice,
        format_hint: FormatHint,
        speed: Option<f32>,
    ) -> Result<SynthesisOutput, GatewayError>;

    /// Whether this adapter claims to support the named voice.
    ///
    /// Static-list and wildcard adapters answer synchronously from
    /// in-memory state; adapters with dynamic catalogs should refresh
    /// that state out-of-band (at registry build time) rather than making
    /// a network call from this hot path.
    fn supports_voice(&self, voice_name: &str) -> bool;

    /// Query this backend's voice-list endpoint, once, at startup.
    ///
    /// Backends with a dynamic catalog (e.g. a neural server that reports
    /// its own installed voices) override this to hit their catalog
    /// endpoint and should also refresh whatever in-memory state backs
    /// [`supports_voice`]. Backends whose voices are addressed purely by
    /// name with no enumerable catalog (clone, session, wildcard-style
    /// backends) keep the default empty result — that is not an error,
    /// just nothing for the registry to merge in.
    async fn list_voices(&self) -> Result<Vec<Voice>, GatewayError> {
        Ok(Vec::new())
    }

    /// Maximum concurrent in-flight requests this adapter tolerates.
    fn max_concurrency(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hint_parses_case_insensitively() {
        assert_eq!(FormatHint::parse("MP3"), Some(FormatHint::Mp3));
        assert_eq!(FormatHint::parse("unknown"), None);
    }
}
