//! Voice catalog types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A tag identifying an upstream engine family.
///
/// Closed set, per the design note in SPEC_FULL.md §9: the source's
/// dynamic list of adapter classes becomes a fixed, compile-time set of
/// variants. Adding a new upstream means adding a variant plus an
/// adapter implementation, not loading a plugin at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// REST + JSON body neural TTS server (e.g. a Kokoro-style server).
    NeuralRest,
    /// Multipart form upload voice-clone server.
    VoiceCloneMultipart,
    /// Session/channel call: open session, post params, poll result.
    SessionChannel,
    /// WebSocket-style emotion/streaming server.
    EmotionWebSocket,
    /// Hosted cloud API authenticated with a bearer key.
    CloudApiKey,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::NeuralRest => "neural_rest",
            BackendKind::VoiceCloneMultipart => "voice_clone_multipart",
            BackendKind::SessionChannel => "session_channel",
            BackendKind::EmotionWebSocket => "emotion_websocket",
            BackendKind::CloudApiKey => "cloud_api_key",
        }
    }

    pub fn all() -> [BackendKind; 5] {
        [
            BackendKind::NeuralRest,
            BackendKind::VoiceCloneMultipart,
            BackendKind::SessionChannel,
            BackendKind::EmotionWebSocket,
            BackendKind::CloudApiKey,
        ]
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the merged voice catalog.
///
/// Voice identifiers follow backend conventions (e.g. `bf_emma` for
/// neural catalogs, arbitrary names for user-registered clones).
/// Uniqueness is enforced across the merged catalog by the registry that
/// builds these (`tts-gateway-router::registry`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    /// Identifier, unique within the merged catalog.
    pub name: String,
    /// Display category, e.g. "British Female".
    pub category: Option<String>,
    /// Backend that owns this voice entry.
    pub backend: BackendKind,
    /// Reference audio path, for voice-clone backends.
    pub reference_audio: Option<PathBuf>,
    /// Reference transcript, improves clone fidelity when present.
    pub reference_transcript: Option<String>,
}

impl Voice {
    pub fn new(name: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            name: name.into(),
            category: None,
            backend,
            reference_audio: None,
            reference_transcript: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_reference(mut self, audio: PathBuf, transcript: Option<String>) -> Self {
        self.reference_audio = Some(audio);
        self.reference_transcript = transcript;
        self
    }

    pub fn is_clone(&self) -> bool {
        self.reference_audio.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_round_trips_through_str() {
        for kind in BackendKind::all() {
            assert_eq!(kind.as_str(), kind.to_string());
        }
    }

    #[test]
    fn voice_builder_sets_clone_fields() {
        let voice = Voice::new("emma_clone", BackendKind::VoiceCloneMultipart)
            .with_category("British Female")
            .with_reference(PathBuf::from("/voices/emma/reference.wav"), None);

        assert!(voice.is_clone());
        assert_eq!(voice.category.as_deref(), Some("British Female"));
    }
}
