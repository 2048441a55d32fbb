//! Per-voice backend overrides, persisted to disk.
//!
//! Reads happen off a lock-free snapshot (an `Arc<HashMap<..>>` swapped on
//! write) so a request on the hot path never blocks behind a write.
//! Writes are serialized through a mutex and go to a temp file followed by
//! a rename, so a crash mid-write never leaves a truncated preferences
//! file behind.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tts_gateway_core::error::GatewayError;
use tts_gateway_core::voice::BackendKind;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default)]
    voice_backend: HashMap<String, BackendKind>,
}

pub struct VoicePreferences {
    path: PathBuf,
    current: Mutex<Arc<HashMap<String, BackendKind>>>,
}

impl VoicePreferences {
    /// Load from `path`, treating a missing or unreadable file as "no
    /// preferences yet" rather than a startup error.
    pub fn load(path: PathBuf) -> Self {
        let loaded = std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str::<PreferencesFile>(&contents).ok())
            .map(|f| f.voice_backend)
            .unwrap_or_default();

        Self {
            path,
            current: Mutex::new(Arc::new(loaded)),
        }
    }

    pub fn get(&self, voice_name: &str) -> Option<BackendKind> {
        self.current.lock().get(voice_name).copied()
    }

    pub fn snapshot(&self) -> Arc<HashMap<String, BackendKind>> {
        self.current.lock().clone()
    }

    pub fn set(&self, voice_name: String, backend: BackendKind) -> Result<(), GatewayError> {
        let mut guard = self.current.lock();
        let mut updated = (**guard).clone();
        updated.insert(voice_name, backend);
        self.persist(&updated)?;
        *guard = Arc::new(updated);
        Ok(())
    }

    pub fn remove(&self, voice_name: &str) -> Result<(), GatewayError> {
        let mut guard = self.current.lock();
        let mut updated = (**guard).clone();
        updated.remove(voice_name);
        self.persist(&updated)?;
        *guard = Arc::new(updated);
        Ok(())
    }

    fn persist(&self, voice_backend: &HashMap<String, BackendKind>) -> Result<(), GatewayError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GatewayError::InvalidRequest(format!("cannot create preferences directory: {e}"))
            })?;
        }

        let file = PreferencesFile {
            voice_backend: voice_backend.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| GatewayError::InvalidRequest(format!("cannot serialize preferences: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)
            .map_err(|e| GatewayError::InvalidRequest(format!("cannot write preferences temp file: {e}")))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| GatewayError::InvalidRequest(format!("cannot commit preferences file: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_starts_with_no_preferences() {
        let prefs = VoicePreferences::load(PathBuf::from("/nonexistent/prefs.json"));
        assert_eq!(prefs.get("emma"), None);
    }

    #[test]
    fn set_persists_and_is_visible_to_a_fresh_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let prefs = VoicePreferences::load(path.clone());
        prefs.set("emma".to_string(), BackendKind::CloudApiKey).unwrap();
        assert_eq!(prefs.get("emma"), Some(BackendKind::CloudApiKey));

        let reloaded = VoicePreferences::load(path);
        assert_eq!(reloaded.get("emma"), Some(BackendKind::CloudApiKey));
    }

    #[test]
    fn remove_clears_a_preference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let prefs = VoicePreferences::load(path);
        prefs.set("emma".to_string(), BackendKind::CloudApiKey).unwrap();
        prefs.remove("emma").unwrap();
        assert_eq!(prefs.get("emma"), None);
    }
}
