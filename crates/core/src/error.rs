//! Pipeline-wide error taxonomy.
//!
//! Mirrors the teacher's `ServerError` pattern in shape: a single
//! `thiserror`-derived enum with a `From<GatewayError> for StatusCode`
//! impl so the HTTP layer never has to re-derive disposition logic.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("voice unknown: {0}")]
    VoiceUnknown(String),

    #[error("chunk too large: {0}")]
    ChunkTooLarge(String),

    #[error("backend transient failure ({backend}): {message}")]
    BackendTransient { backend: String, message: String },

    #[error("backend definitive failure ({backend}): {message}")]
    BackendDefinitive { backend: String, message: String },

    #[error("stitch failure: {0}")]
    StitchFailure(String),

    #[error("encode failure: {0}")]
    EncodeFailure(String),

    #[error("request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Short machine-readable tag for the `{error: {kind, ...}}` JSON body.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::VoiceUnknown(_) => "voice_unknown",
            GatewayError::ChunkTooLarge(_) => "chunk_too_large",
            GatewayError::BackendTransient { .. } => "backend_transient",
            GatewayError::BackendDefinitive { .. } => "backend_definitive",
            GatewayError::StitchFailure(_) => "stitch_failure",
            GatewayError::EncodeFailure(_) => "encode_failure",
            GatewayError::Cancelled => "cancelled",
        }
    }

    /// Whether a router failover chain should try the next adapter on this
    /// error, per spec.md §7's propagation policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::BackendTransient { .. })
    }
}

impl From<&GatewayError> for StatusCode {
    fn from(err: &GatewayError) -> Self {
        match err {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::VoiceUnknown(_) => StatusCode::NOT_FOUND,
            GatewayError::ChunkTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BackendTransient { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::BackendDefinitive { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::StitchFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::EncodeFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GatewayError> for StatusCode {
    fn from(err: GatewayError) -> Self {
        StatusCode::from(&err)
    }
}

/// Wire shape for `{error: {kind, message}}` HTTP error bodies.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub message: String,
}

impl From<&GatewayError> for ErrorBody {
    fn from(err: &GatewayError) -> Self {
        ErrorBody {
            error: ErrorDetail {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable_definitive_are_not() {
        let transient = GatewayError::BackendTransient {
            backend: "neural_rest".into(),
            message: "timeout".into(),
        };
        let definitive = GatewayError::BackendDefinitive {
            backend: "neural_rest".into(),
            message: "voice unknown".into(),
        };
        assert!(transient.is_retryable());
        assert!(!definitive.is_retryable());
    }

    #[test]
    fn status_codes_match_spec_table() {
        assert_eq!(
            StatusCode::from(GatewayError::VoiceUnknown("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StatusCode::from(GatewayError::ChunkTooLarge("x".into())),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
