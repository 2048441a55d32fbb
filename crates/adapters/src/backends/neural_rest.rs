//! Adapter for a single-call REST+JSON neural TTS backend: one request in,
//! one WAV response out. The simplest of the five protocol patterns.

use std::collections::HashSet;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use tts_gateway_core::adapter::{FormatHint, SynthesisAdapter, SynthesisOutput};
use tts_gateway_core::error::GatewayError;
use tts_gateway_core::profile::BackendProfile;
use tts_gateway_core::voice::{BackendKind, Voice};

use crate::backends::{reqwest_error, status_to_error};
use crate::retry::with_retry;
use crate::wav::decode_wav_bytes;

const MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF: Duration = Duration::from_millis(150);

pub struct NeuralRestAdapter {
    client: Client,
    base_url: String,
    profile: BackendProfile,
    semaphore: Semaphore,
    /// Voice names reported by the last successful [`list_voices`] query.
    /// Empty until the registry's startup catalog scan runs once.
    known_voices: RwLock<HashSet<String>>,
}

impl NeuralRestAdapter {
    pub fn new(base_url: String, profile: BackendProfile) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(profile.timeout_secs))
            .build()
            .map_err(|e| GatewayError::BackendDefinitive {
                backend: "neural_rest".to_string(),
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url,
            profile,
            semaphore: Semaphore::new(profile.max_concurrency),
            known_voices: RwLock::new(HashSet::new()),
        })
    }
}

#[derive(Deserialize)]
struct VoiceCatalogEntry {
    name: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Deserialize)]
struct VoiceCatalogResponse {
    voices: Vec<VoiceCatalogEntry>,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

#[derive(Deserialize)]
struct SynthesizeError {
    #[serde(default)]
    message: String,
}

#[async_trait]
impl SynthesisAdapter for NeuralRestAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::NeuralRest
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &Voice,
        format_hint: FormatHint,
        speed: Option<f32>,
    ) -> Result<SynthesisOutput, GatewayError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        let body = SynthesizeRequest {
            text,
            voice: &voice.name,
            format: format_hint.as_str(),
            speed,
        };

        let bytes = with_retry("neural_rest", MAX_RETRIES, INITIAL_BACKOFF, || async {
            let response = self
                .client
                .post(format!("{}/v1/synthesize", self.base_url))
                .json(&body)
                .send()
                .await
                .map_err(|e| reqwest_error("neural_rest", e))?;

            let status = response.status();
            if !status.is_success() {
                let parsed: Option<SynthesizeError> = response.json().await.ok();
                let message = parsed.map(|e| e.message).unwrap_or_default();
                return Err(status_to_error("neural_rest", status, message));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| reqwest_error("neural_rest", e))
        })
        .await?;

        let audio = decode_wav_bytes(&bytes)?;
        Ok(SynthesisOutput {
            audio,
            raw_bytes: bytes,
            raw_format: FormatHint::Wav,
        })
    }

    fn supports_voice(&self, voice_name: &str) -> bool {
        self.known_voices.read().contains(voice_name)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, GatewayError> {
        let response = self
            .client
            .get(format!("{}/v1/voices", self.base_url))
            .send()
            .await
            .map_err(|e| reqwest_error("neural_rest", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error("neural_rest", status, body));
        }

        let catalog: VoiceCatalogResponse = response
            .json()
            .await
            .map_err(|e| reqwest_error("neural_rest", e))?;

        let mut known = self.known_voices.write();
        known.clear();
        let voices = catalog
            .voices
            .into_iter()
            .map(|entry| {
                known.insert(entry.name.clone());
                let voice = Voice::new(entry.name, BackendKind::NeuralRest);
                match entry.category {
                    Some(category) => voice.with_category(category),
                    None => voice,
                }
            })
            .collect();
        Ok(voices)
    }

    fn max_concurrency(&self) -> usize {
        self.profile.max_concurrency
    }
}
