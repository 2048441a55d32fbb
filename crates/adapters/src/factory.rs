//! Builds the live adapter set from configuration, the way the teacher's
//! LLM factory turns an `LlmConfig` into a boxed `LlmBackend`: one
//! `BackendKind` maps to exactly one concrete adapter type, and a backend
//! with no configured URL is simply absent from the returned map rather
//! than failing startup.

use std::collections::HashMap;
use std::sync::Arc;

use tts_gateway_config::Settings;
use tts_gateway_core::adapter::SynthesisAdapter;
use tts_gateway_core::error::GatewayError;
use tts_gateway_core::profile::{default_profiles, BackendProfile};
use tts_gateway_core::voice::BackendKind;

use crate::backends::{
    CloudApiKeyAdapter, EmotionWebSocketAdapter, NeuralRestAdapter, SessionChannelAdapter,
    VoiceCloneMultipartAdapter,
};

pub type AdapterMap = HashMap<BackendKind, Arc<dyn SynthesisAdapter>>;

/// Overrides `profile.timeout_secs` with `UNIFIED_TTS_ADAPTER_TIMEOUT_SECS`
/// when set, otherwise leaves the backend's own profile default untouched.
fn apply_timeout_override(mut profile: BackendProfile, override_timeout: Option<u64>) -> BackendProfile {
    if let Some(timeout_secs) = override_timeout {
        profile.timeout_secs = timeout_secs;
    }
    profile
}

/// Construct one adapter per configured backend. Logs and skips any
/// backend whose endpoint fails to build a client rather than aborting the
/// whole gateway, since the remaining backends may still serve traffic.
pub fn build_adapters(settings: &Settings) -> AdapterMap {
    let profiles: HashMap<BackendKind, BackendProfile> = default_profiles()
        .into_iter()
        .map(|p| (p.kind, p))
        .collect();

    let mut adapters: AdapterMap = HashMap::new();

    for (kind, endpoint) in &settings.backends {
        let profile = apply_timeout_override(profiles[kind], settings.adapter_timeout_secs);
        let built: Result<Arc<dyn SynthesisAdapter>, GatewayError> = match kind {
            BackendKind::NeuralRest => {
                NeuralRestAdapter::new(endpoint.url.clone(), profile).map(|a| Arc::new(a) as _)
            }
            BackendKind::VoiceCloneMultipart => {
                VoiceCloneMultipartAdapter::new(endpoint.url.clone(), profile).map(|a| Arc::new(a) as _)
            }
            BackendKind::SessionChannel => {
                SessionChannelAdapter::new(endpoint.url.clone(), profile).map(|a| Arc::new(a) as _)
            }
            BackendKind::EmotionWebSocket => {
                Ok(Arc::new(EmotionWebSocketAdapter::new(endpoint.url.clone(), profile)) as _)
            }
            BackendKind::CloudApiKey => {
                let Some(api_key) = endpoint.api_key.clone() else {
                    tracing::warn!(%kind, "cloud_api_key backend configured without an api key, skipping");
                    continue;
                };
                CloudApiKeyAdapter::new(endpoint.url.clone(), api_key, profile).map(|a| Arc::new(a) as _)
            }
        };

        match built {
            Ok(adapter) => {
                adapters.insert(*kind, adapter);
            }
            Err(e) => tracing::warn!(%kind, error = %e, "failed to initialize adapter, it will stay down"),
        }
    }

    adapters
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;
    use tts_gateway_config::{BackendEndpoint, Settings};
    use std::path::PathBuf;

    fn base_settings() -> Settings {
        Settings {
            host: "0.0.0.0".into(),
            port: 8765,
            voice_dir: PathBuf::from("/tmp/voices"),
            preferences_path: PathBuf::from("/tmp/prefs.json"),
            default_backend: BackendKind::NeuralRest,
            backends: StdHashMap::new(),
            adapter_timeout_secs: None,
            global_chunk_parallelism: 16,
        }
    }

    #[test]
    fn skips_cloud_backend_with_no_api_key() {
        let mut settings = base_settings();
        settings.backends.insert(
            BackendKind::CloudApiKey,
            BackendEndpoint {
                kind: BackendKind::CloudApiKey,
                url: "https://api.example.com".into(),
                api_key: None,
            },
        );
        let adapters = build_adapters(&settings);
        assert!(!adapters.contains_key(&BackendKind::CloudApiKey));
    }

    #[test]
    fn timeout_override_replaces_the_profile_default_when_set() {
        let profile = default_profiles()
            .into_iter()
            .find(|p| p.kind == BackendKind::NeuralRest)
            .unwrap();
        let overridden = apply_timeout_override(profile, Some(5));
        assert_eq!(overridden.timeout_secs, 5);

        let unchanged = apply_timeout_override(profile, None);
        assert_eq!(unchanged.timeout_secs, profile.timeout_secs);
    }

    #[test]
    fn builds_configured_rest_backend() {
        let mut settings = base_settings();
        settings.backends.insert(
            BackendKind::NeuralRest,
            BackendEndpoint {
                kind: BackendKind::NeuralRest,
                url: "http://localhost:9000".into(),
                api_key: None,
            },
        );
        let adapters = build_adapters(&settings);
        assert!(adapters.contains_key(&BackendKind::NeuralRest));
    }
}
