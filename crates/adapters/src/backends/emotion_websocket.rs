//! Adapter for a streaming WebSocket backend that synthesizes expressive
//! speech: the client sends one text+emotion message and receives a
//! sequence of binary audio frames terminated by a JSON `{"done":true}`
//! control message.

use std::time::Duration;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use tts_gateway_core::adapter::{FormatHint, SynthesisAdapter, SynthesisOutput};
use tts_gateway_core::error::GatewayError;
use tts_gateway_core::profile::BackendProfile;
use tts_gateway_core::voice::{BackendKind, Voice};

use crate::wav::decode_wav_bytes;

pub struct EmotionWebSocketAdapter {
    ws_url: String,
    profile: BackendProfile,
    semaphore: Semaphore,
}

#[derive(Serialize)]
struct SynthesizeMessage<'a> {
    text: &'a str,
    voice: &'a str,
    emotion: &'a str,
}

#[derive(Deserialize)]
struct ControlMessage {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl EmotionWebSocketAdapter {
    pub fn new(ws_url: String, profile: BackendProfile) -> Self {
        Self {
            ws_url,
            profile,
            semaphore: Semaphore::new(profile.max_concurrency),
        }
    }
}

#[async_trait]
impl SynthesisAdapter for EmotionWebSocketAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::EmotionWebSocket
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
            tracing::debug!(voice = %voice.name, "emotion_websocket ignores the speed parameter");
        }

        let emotion = voice.category.as_deref().unwrap_or("neutral");

        let (mut stream, _) = timeout(
            Duration::from_secs(self.profile.timeout_secs),
            connect_async(&self.ws_url),
        )
        .await
        .map_err(|_| GatewayError::BackendTransient {
            backend: "emotion_websocket".to_string(),
            message: "timed out connecting".to_string(),
        })?
        .map_err(|e| GatewayError::BackendTransient {
            backend: "emotion_websocket".to_string(),
            message: e.to_string(),
        })?;

        let request = serde_json::to_string(&SynthesizeMessage {
            text,
            voice: &voice.name,
            emotion,
        })
        .expect("synthesize message always serializes");

        stream
            .send(Message::Text(request))
            .await
            .map_err(|e| GatewayError::BackendTransient {
                backend: "emotion_websocket".to_string(),
                message: e.to_string(),
            })?;

        let mut audio_bytes = Vec::new();
        let body = timeout(Duration::from_secs(self.profile.timeout_secs), async {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Binary(chunk))) => audio_bytes.extend_from_slice(&chunk),
                    Some(Ok(Message::Text(text))) => {
                        let control: ControlMessage = serde_json::from_str(&text).map_err(|e| {
                            GatewayError::BackendDefinitive {
                                backend: "emotion_websocket".to_string(),
                                message: format!("unparseable control message: {e}"),
                            }
                        })?;
                        if let Some(message) = control.error {
                            return Err(GatewayError::BackendDefinitive {
                                backend: "emotion_websocket".to_string(),
                                message,
                            });
                        }
                        if control.done {
                            return Ok(());
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        return Err(GatewayError::BackendTransient {
                            backend: "emotion_websocket".to_string(),
                            message: e.to_string(),
                        })
                    }
                }
            }
        })
        .await
        .map_err(|_| GatewayError::BackendTransient {
            backend: "emotion_websocket".to_string(),
            message: "timed out waiting for audio stream to finish".to_string(),
        })?;
        body?;

        let _ = stream.close(None).await;

        let audio = decode_wav_bytes(&audio_bytes)?;
        Ok(SynthesisOutput {
            audio,
            raw_bytes: audio_bytes,
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
