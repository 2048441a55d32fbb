//! Adapter for backends that model synthesis as a stateful session: open a
//! channel, push text through it, tear it down. Three HTTP calls per
//! synthesis instead of one, with the session torn down even on failure.

use std::time::Duration;
use async_trait::async_trait;
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

const MAX_RETRIES: u32 = 1;
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

pub struct SessionChannelAdapter {
    client: Client,
    base_url: String,
    profile: BackendProfile,
    semaphore: Semaphore,
}

#[derive(Serialize)]
struct OpenSessionRequest<'a> {
    voice: &'a str,
}

#[derive(Deserialize)]
struct OpenSessionResponse {
    session_id: String,
}

#[derive(Serialize)]
struct SynthesizeInSessionRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

impl SessionChannelAdapter {
    pub fn new(base_url: String, profile: BackendProfile) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(profile.timeout_secs))
            .build()
            .map_err(|e| GatewayError::BackendDefinitive {
                backend: "session_channel".to_string(),
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url,
            profile,
            semaphore: Semaphore::new(profile.max_concurrency),
        })
    }

    async fn open_session(&self, voice: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(format!("{}/session", self.base_url))
            .json(&OpenSessionRequest { voice })
            .send()
            .await
            .map_err(|e| reqwest_error("session_channel", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error("session_channel", status, body));
        }
        response
            .json::<OpenSessionResponse>()
            .await
            .map(|r| r.session_id)
            .map_err(|e| reqwest_error("session_channel", e))
    }

    async fn close_session(&self, session_id: &str) {
        if let Err(e) = self
            .client
            .delete(format!("{}/session/{}", self.base_url, session_id))
            .send()
            .await
        {
            tracing::warn!(session_id, error = %e, "failed to close session, it will expire server-side");
        }
    }
}

#[async_trait]
impl SynthesisAdapter for SessionChannelAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::SessionChannel
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
            tracing::debug!(voice = %voice.name, "session_channel ignores the speed parameter");
        }

        let session_id = with_retry("session_channel", MAX_RETRIES, INITIAL_BACKOFF, || {
            self.open_session(&voice.name)
        })
        .await?;

        let result = with_retry("session_channel", MAX_RETRIES, INITIAL_BACKOFF, || async {
            let response = self
                .client
                .post(format!("{}/session/{}/synthesize", self.base_url, session_id))
                .json(&SynthesizeInSessionRequest { text, speed: None })
                .send()
                .await
                .map_err(|e| reqwest_error("session_channel", e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_to_error("session_channel", status, body));
            }
            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| reqwest_error("session_channel", e))
        })
        .await;

        self.close_session(&session_id).await;

        let bytes = result?;
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
