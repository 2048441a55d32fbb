//! Adapter for voice-cloning backends that take a multipart upload:
//! target text, a reference audio sample, and optionally the transcript of
//! that sample to help the model align prosody.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{multipart, Client};
use tokio::sync::Semaphore;

use tts_gateway_core::adapter::{FormatHint, SynthesisAdapter, SynthesisOutput};
use tts_gateway_core::error::GatewayError;
use tts_gateway_core::profile::BackendProfile;
use tts_gateway_core::voice::{BackendKind, Voice};

use crate::backends::{reqwest_error, status_to_error};
use crate::retry::with_retry;
use crate::wav::decode_wav_bytes;

const MAX_RETRIES: u32 = 1;
const INITIAL_BACKOFF: Duration = Duration::from_millis(300);

pub struct VoiceCloneMultipartAdapter {
    client: Client,
    base_url: String,
    profile: BackendProfile,
    semaphore: Semaphore,
}

impl VoiceCloneMultipartAdapter {
    pub fn new(base_url: String, profile: BackendProfile) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(profile.timeout_secs))
            .build()
            .map_err(|e| GatewayError::BackendDefinitive {
                backend: "voice_clone_multipart".to_string(),
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url,
            profile,
            semaphore: Semaphore::new(profile.max_concurrency),
        })
    }

    async fn build_form(&self, text: &str, voice: &Voice) -> Result<multipart::Form, GatewayError> {
        let reference_path = voice.reference_audio.as_ref().ok_or_else(|| {
            GatewayError::BackendDefinitive {
                backend: "voice_clone_multipart".to_string(),
                message: format!("voice '{}' has no reference audio to clone from", voice.name),
            }
        })?;

        let reference_bytes = tokio::fs::read(reference_path).await.map_err(|e| {
            GatewayError::BackendDefinitive {
                backend: "voice_clone_multipart".to_string(),
                message: format!("failed to read reference audio {reference_path:?}: {e}"),
            }
        })?;

        let file_name = reference_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "reference.wav".to_string());

        let mut form = multipart::Form::new()
            .text("text", text.to_string())
            .part("reference_audio", multipart::Part::bytes(reference_bytes).file_name(file_name));

        if let Some(transcript) = &voice.reference_transcript {
            form = form.text("reference_transcript", transcript.clone());
        }

        Ok(form)
    }
}

#[async_trait]
impl SynthesisAdapter for VoiceCloneMultipartAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::VoiceCloneMultipart
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &Voice,
        _format_hint: FormatHint,
        speed: Option<f32>,
    ) -> Result<SynthesisOutput, GatewayError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        if speed.is_some() {
            tracing::debug!(voice = %voice.name, "voice_clone_multipart ignores the speed parameter");
        }

        let bytes = with_retry(
            "voice_clone_multipart",
            MAX_RETRIES,
            INITIAL_BACKOFF,
            || async {
                let form = self.build_form(text, voice).await?;
                let response = self
                    .client
                    .post(format!("{}/clone", self.base_url))
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| reqwest_error("voice_clone_multipart", e))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(status_to_error("voice_clone_multipart", status, body));
                }

                response
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|e| reqwest_error("voice_clone_multipart", e))
            },
        )
        .await?;

        let audio = decode_wav_bytes(&bytes)?;
        Ok(SynthesisOutput {
            audio,
            raw_bytes: bytes,
            raw_format: FormatHint::Wav,
        })
    }

    fn supports_voice(&self, _voice_name: &str) -> bool {
        true
    }

    fn max_concurrency(&self) -> usize {
        self.profile.max_concurrency
    }
}
