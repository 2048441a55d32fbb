//! Merged voice catalog: backend-reported voices plus locally registered
//! voice clones discovered on disk.
//!
//! A clone directory layout is `<voice_dir>/<name>/reference.{wav,mp3,flac}`
//! with an optional sibling `transcript.txt`. A name present both on disk
//! and in a backend's reported catalog resolves to the clone entry — the
//! operator explicitly registered it, so it should win.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tts_gateway_core::error::GatewayError;
use tts_gateway_core::voice::{BackendKind, Voice};

const REFERENCE_EXTENSIONS: [&str; 3] = ["wav", "mp3", "flac"];

pub struct VoiceRegistry {
    voice_dir: PathBuf,
    voices: RwLock<HashMap<String, Voice>>,
}

impl VoiceRegistry {
    pub fn new(voice_dir: PathBuf) -> Self {
        Self {
            voice_dir,
            voices: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild the catalog from `backend_reported` (one vec per live
    /// adapter) merged with a fresh scan of the clone directory. Takes the
    /// write lock for the whole rebuild so readers never see a partial
    /// catalog.
    pub fn reload(&self, backend_reported: &HashMap<BackendKind, Vec<Voice>>) -> Result<(), GatewayError> {
        let mut merged = HashMap::new();
        for voices in backend_reported.values() {
            for voice in voices {
                merged.insert(voice.name.clone(), voice.clone());
            }
        }

        for voice in scan_voice_dir(&self.voice_dir)? {
            merged.insert(voice.name.clone(), voice);
        }

        *self.voices.write() = merged;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Voice> {
        self.voices.read().get(name).cloned()
    }

    pub fn list(&self) -> Vec<Voice> {
        self.voices.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.voices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn scan_voice_dir(voice_dir: &Path) -> Result<Vec<Voice>, GatewayError> {
    let entries = match std::fs::read_dir(voice_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(GatewayError::InvalidRequest(format!(
                "cannot read voice directory {voice_dir:?}: {e}"
            )))
        }
    };

    let mut voices = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        let reference_audio = REFERENCE_EXTENSIONS
            .iter()
            .map(|ext| path.join(format!("reference.{ext}")))
            .find(|candidate| candidate.exists());

        let Some(reference_audio) = reference_audio else {
            tracing::warn!(voice = %name, "voice directory has no reference.{{wav,mp3,flac}}, skipping");
            continue;
        };

        let transcript = std::fs::read_to_string(path.join("transcript.txt")).ok();

        voices.push(Voice::new(name, BackendKind::VoiceCloneMultipart).with_reference(reference_audio, transcript));
    }
    Ok(voices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_clone_directories_and_skips_ones_with_no_reference_audio() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("emma")).unwrap();
        std::fs::write(dir.path().join("emma/reference.wav"), b"fake").unwrap();
        std::fs::write(dir.path().join("emma/transcript.txt"), "hello there").unwrap();
        std::fs::create_dir(dir.path().join("incomplete")).unwrap();

        let voices = scan_voice_dir(dir.path()).unwrap();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].name, "emma");
        assert_eq!(voices[0].reference_transcript.as_deref(), Some("hello there"));
    }

    #[test]
    fn clone_directory_wins_over_backend_reported_voice_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("shared_name")).unwrap();
        std::fs::write(dir.path().join("shared_name/reference.wav"), b"fake").unwrap();

        let registry = VoiceRegistry::new(dir.path().to_path_buf());
        let mut reported = HashMap::new();
        reported.insert(
            BackendKind::NeuralRest,
            vec![Voice::new("shared_name", BackendKind::NeuralRest)],
        );
        registry.reload(&reported).unwrap();

        let resolved = registry.get("shared_name").unwrap();
        assert_eq!(resolved.backend, BackendKind::VoiceCloneMultipart);
        assert!(resolved.is_clone());
    }

    #[test]
    fn missing_voice_directory_yields_empty_catalog_not_an_error() {
        let registry = VoiceRegistry::new(PathBuf::from("/nonexistent/path/for/sure"));
        registry.reload(&HashMap::new()).unwrap();
        assert!(registry.is_empty());
    }
}
