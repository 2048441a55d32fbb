//! Main settings module.

use std::collections::HashMap;
use std::path::PathBuf;

use tts_gateway_core::voice::BackendKind;

use crate::ConfigError;

/// One configured upstream: its base URL and, for cloud backends, an API
/// key. Read from `<BACKEND>_URL` / `<CLOUD>_API_KEY` environment
/// variables (spec.md §6).
#[derive(Debug, Clone)]
pub struct BackendEndpoint {
    pub kind: BackendKind,
    pub url: String,
    pub api_key: Option<String>,
}

/// Top-level gateway settings, built once at startup from the process
/// environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub voice_dir: PathBuf,
    pub preferences_path: PathBuf,
    pub default_backend: BackendKind,
    pub backends: HashMap<BackendKind, BackendEndpoint>,
    /// Overrides every backend's own profile `timeout_secs` when set.
    /// `None` (the default, unset) leaves each backend's per-profile
    /// default untouched.
    pub adapter_timeout_secs: Option<u64>,
    pub global_chunk_parallelism: usize,
}

impl Settings {
    /// Build settings from the process environment.
    ///
    /// Unset `<BACKEND>_URL` variables simply leave that backend
    /// unconfigured (its adapter is marked `down` at startup rather than
    /// aborting the whole server, per spec.md §7's "Adapter initialization
    /// errors... log a warning... server still starts" policy).
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("UNIFIED_TTS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("UNIFIED_TTS_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8765);

        let voice_dir = std::env::var("UNIFIED_TTS_VOICE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_voice_dir());

        let preferences_path = default_home_dir().join("voice_prefs.json");

        let mut backends = HashMap::new();
        for (kind, env_prefix) in [
            (BackendKind::NeuralRest, "NEURAL_REST"),
            (BackendKind::VoiceCloneMultipart, "VOICE_CLONE"),
            (BackendKind::SessionChannel, "SESSION_CHANNEL"),
            (BackendKind::EmotionWebSocket, "EMOTION_WS"),
            (BackendKind::CloudApiKey, "CLOUD_TTS"),
        ] {
            if let Ok(url) = std::env::var(format!("{env_prefix}_URL")) {
                let api_key = std::env::var(format!("{env_prefix}_API_KEY")).ok();
                backends.insert(kind, BackendEndpoint { kind, url, api_key });
            }
        }

        let default_backend = std::env::var("UNIFIED_TTS_DEFAULT_BACKEND")
            .ok()
            .and_then(|s| parse_backend_kind(&s))
            .unwrap_or(BackendKind::NeuralRest);

        let adapter_timeout_secs = std::env::var("UNIFIED_TTS_ADAPTER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        let global_chunk_parallelism = std::env::var("UNIFIED_TTS_CHUNK_PARALLELISM")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(16);

        Ok(Self {
            host,
            port,
            voice_dir,
            preferences_path,
            default_backend,
            backends,
            adapter_timeout_secs,
            global_chunk_parallelism,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".unified-tts")
}

fn default_voice_dir() -> PathBuf {
    default_home_dir().join("voices")
}

fn parse_backend_kind(s: &str) -> Option<BackendKind> {
    match s.to_ascii_lowercase().as_str() {
        "neural_rest" | "neural" => Some(BackendKind::NeuralRest),
        "voice_clone_multipart" | "voice_clone" => Some(BackendKind::VoiceCloneMultipart),
        "session_channel" | "session" => Some(BackendKind::SessionChannel),
        "emotion_websocket" | "emotion_ws" => Some(BackendKind::EmotionWebSocket),
        "cloud_api_key" | "cloud" => Some(BackendKind::CloudApiKey),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        // SAFETY: test runs single-threaded within this process; no other
        // test in this crate touches these variable names.
        for var in [
            "UNIFIED_TTS_HOST",
            "UNIFIED_TTS_PORT",
            "UNIFIED_TTS_VOICE_DIR",
            "UNIFIED_TTS_DEFAULT_BACKEND",
        ] {
            std::env::remove_var(var);
        }
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8765);
        assert_eq!(settings.default_backend, BackendKind::NeuralRest);
    }

    #[test]
    fn parses_configured_backend_urls() {
        std::env::set_var("NEURAL_REST_URL", "http://localhost:9000");
        let settings = Settings::from_env().unwrap();
        assert_eq!(
            settings.backends[&BackendKind::NeuralRest].url,
            "http://localhost:9000"
        );
        std::env::remove_var("NEURAL_REST_URL");
    }
}
