//! Backend selection and failover, modeled on the pack's `TtsManager`:
//! try a preferred backend, fall through a deterministic candidate order
//! on failure instead of giving up after one attempt.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tts_gateway_adapters::AdapterMap;
use tts_gateway_config::Settings;
use tts_gateway_core::adapter::{FormatHint, SynthesisAdapter, SynthesisOutput};
use tts_gateway_core::error::GatewayError;
use tts_gateway_core::profile::{default_profiles, BackendProfile};
use tts_gateway_core::voice::{BackendKind, Voice};

use crate::health::{BackendHealth, HealthRecord, HealthState};
use crate::preferences::VoicePreferences;
use crate::registry::VoiceRegistry;

pub struct Router {
    pub registry: VoiceRegistry,
    pub preferences: VoicePreferences,
    health: BackendHealth,
    adapters: AdapterMap,
    profiles: HashMap<BackendKind, BackendProfile>,
    default_backend: RwLock<BackendKind>,
}

impl Router {
    pub fn new(settings: &Settings, adapters: AdapterMap) -> Self {
        let profiles = default_profiles().into_iter().map(|p| (p.kind, p)).collect();
        Self {
            registry: VoiceRegistry::new(settings.voice_dir.clone()),
            preferences: VoicePreferences::load(settings.preferences_path.clone()),
            health: BackendHealth::new(),
            adapters,
            profiles,
            default_backend: RwLock::new(settings.default_backend),
        }
    }

    pub fn profile_for(&self, kind: BackendKind) -> Option<BackendProfile> {
        self.profiles.get(&kind).copied()
    }

    pub fn health_snapshot(&self) -> Vec<(BackendKind, HealthRecord)> {
        self.health.snapshot()
    }

    pub fn configured_backends(&self) -> Vec<BackendKind> {
        self.adapters.keys().copied().collect()
    }

    /// Query every configured adapter's voice-list endpoint once, used to
    /// build the registry's initial merged catalog at startup. A backend
    /// with no adapter configured, or whose query fails, contributes an
    /// empty list rather than aborting the scan.
    pub async fn query_voice_catalogs(&self) -> HashMap<BackendKind, Vec<Voice>> {
        let mut reported = HashMap::new();
        for kind in BackendKind::all() {
            let voices = match self.adapters.get(&kind) {
                Some(adapter) => adapter.list_voices().await.unwrap_or_else(|e| {
                    tracing::warn!(backend = %kind, error = %e, "voice catalog query failed, continuing with an empty catalog for this backend");
                    Vec::new()
                }),
                None => Vec::new(),
            };
            reported.insert(kind, voices);
        }
        reported
    }

    pub fn default_backend(&self) -> BackendKind {
        *self.default_backend.read()
    }

    /// Switches the gateway's default backend at runtime, via
    /// `POST /v1/backends/switch`. Does not require the new default to be
    /// currently healthy — an operator may be pre-staging a recovery.
    pub fn set_default_backend(&self, kind: BackendKind) {
        *self.default_backend.write() = kind;
    }

    /// The candidate the pipeline will try first for `voice`, used to pick
    /// which [`BackendProfile`] governs chunking before any adapter call is
    /// made. Falls back to the voice's own declared backend if no adapter
    /// is configured at all (chunking still needs *some* profile; the
    /// subsequent synthesis call will surface the "no backend configured"
    /// error).
    pub fn chunking_profile(&self, voice: &Voice, explicit_backend: Option<BackendKind>) -> BackendProfile {
        let kind = self
            .candidates(voice, explicit_backend)
            .into_iter()
            .next()
            .unwrap_or(voice.backend);
        self.profile_for(kind).expect("every BackendKind has a default profile")
    }

    pub fn resolve_voice(&self, name: &str) -> Result<Voice, GatewayError> {
        self.registry
            .get(name)
            .ok_or_else(|| GatewayError::VoiceUnknown(name.to_string()))
    }

    /// Ordered candidate backends for `voice`, per the router's selection
    /// policy:
    ///
    /// 0. A request-level explicit backend, if given and it claims to
    ///    support this voice — used alone, with no fallback chain at all.
    /// 1. An explicit voice preference, if one is set and configured.
    /// 2. The voice's own declared backend.
    /// 3. The gateway's configured default backend.
    /// 4. Any other configured backend that isn't currently marked down.
    /// 5. Last resort: configured backends marked down, in case the
    ///    failure was transient and the demotion is stale.
    fn candidates(&self, voice: &Voice, explicit_backend: Option<BackendKind>) -> Vec<BackendKind> {
        if let Some(explicit) = explicit_backend {
            if let Some(adapter) = self.adapters.get(&explicit) {
                if adapter.supports_voice(&voice.name) {
                    return vec![explicit];
                }
            }
        }

        let mut order = Vec::new();
        let mut push_if_configured = |order: &mut Vec<BackendKind>, kind: BackendKind| {
            if !order.contains(&kind) && self.adapters.contains_key(&kind) {
                order.push(kind);
            }
        };

        if let Some(preferred) = self.preferences.get(&voice.name) {
            push_if_configured(&mut order, preferred);
        }
        push_if_configured(&mut order, voice.backend);
        push_if_configured(&mut order, self.default_backend());

        // Steps 4-5: any other configured backend that claims support for
        // this voice, healthy ones first, then down ones as a last resort
        // in case the demotion was stale.
        let mut push_if_supported = |order: &mut Vec<BackendKind>, kind: BackendKind| {
            if order.contains(&kind) {
                return;
            }
            if let Some(adapter) = self.adapters.get(&kind) {
                if adapter.supports_voice(&voice.name) {
                    order.push(kind);
                }
            }
        };

        for kind in BackendKind::all() {
            if self.health.state(kind) != HealthState::Down {
                push_if_supported(&mut order, kind);
            }
        }
        for kind in BackendKind::all() {
            push_if_supported(&mut order, kind);
        }

        order
    }

    /// Synthesize a single chunk, walking the candidate order and stopping
    /// at the first success. Transient failures demote the backend's
    /// health and move on; definitive failures move on without touching
    /// health, since the problem is this request, not the backend.
    pub async fn synthesize_chunk(
        &self,
        text: &str,
        voice: &Voice,
        format_hint: FormatHint,
        speed: Option<f32>,
        explicit_backend: Option<BackendKind>,
        cancel: &CancellationToken,
    ) -> Result<SynthesisOutput, GatewayError> {
        let candidates = self.candidates(voice, explicit_backend);
        if candidates.is_empty() {
            return Err(GatewayError::BackendDefinitive {
                backend: voice.backend.to_string(),
                message: "no backend is configured to serve this voice".to_string(),
            });
        }

        let mut last_err = None;
        for kind in candidates {
            let Some(adapter) = self.adapters.get(&kind) else {
                continue;
            };

            // Race every adapter call against the request's cancellation
            // token so a client disconnect drops the in-flight call
            // immediately instead of waiting for it to finish on its own.
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(GatewayError::Cancelled),
                result = adapter.synthesize(text, voice, format_hint, speed) => result,
            };

            match attempt {
                Ok(output) => {
                    self.health.record_success(kind);
                    return Ok(output);
                }
                Err(GatewayError::Cancelled) => return Err(GatewayError::Cancelled),
                Err(err) => {
                    if err.is_retryable() {
                        let state = self.health.record_failure(kind);
                        if state == HealthState::Down {
                            tracing::warn!(backend = %kind, "demoting backend after repeated transient failures");
                        }
                    }
                    tracing::warn!(backend = %kind, error = %err, "adapter failed, trying next candidate");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| GatewayError::BackendDefinitive {
            backend: voice.backend.to_string(),
            message: "all candidate backends exhausted".to_string(),
        }))
    }
}
