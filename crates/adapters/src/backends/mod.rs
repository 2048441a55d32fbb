pub mod cloud_api_key;
pub mod emotion_websocket;
pub mod neural_rest;
pub mod session_channel;
pub mod voice_clone_multipart;

pub use cloud_api_key::CloudApiKeyAdapter;
pub use emotion_websocket::EmotionWebSocketAdapter;
pub use neural_rest::NeuralRestAdapter;
pub use session_channel::SessionChannelAdapter;
pub use voice_clone_multipart::VoiceCloneMultipartAdapter;

use tts_gateway_core::error::GatewayError;

/// Classify a non-2xx HTTP response as transient (worth a retry / failover
/// to the next backend) or definitive (the request itself is bad).
pub(crate) fn status_to_error(backend: &str, status: reqwest::StatusCode, body: String) -> GatewayError {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        GatewayError::BackendTransient {
            backend: backend.to_string(),
            message: format!("{status}: {body}"),
        }
    } else {
        GatewayError::BackendDefinitive {
            backend: backend.to_string(),
            message: format!("{status}: {body}"),
        }
    }
}

pub(crate) fn reqwest_error(backend: &str, err: reqwest::Error) -> GatewayError {
    if err.is_timeout() || err.is_connect() {
        GatewayError::BackendTransient {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    } else {
        GatewayError::BackendDefinitive {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    }
}
