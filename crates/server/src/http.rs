//! HTTP surface: an OpenAI-compatible subset for text-to-speech, plus the
//! gateway's own backend/voice-preference management endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router as AxumRouter};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tokio_util::sync::CancellationToken;

use tts_gateway_chunker::{self as chunker, ChunkerConfig};
use tts_gateway_core::adapter::{FormatHint, SynthesisOutput};
use tts_gateway_core::error::{ErrorBody, GatewayError};
use tts_gateway_core::redact::TextFingerprint;
use tts_gateway_core::voice::BackendKind;

use crate::state::AppState;

pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/v1/audio/speech", post(create_speech))
        .route("/v1/voices", get(list_voices))
        .route("/v1/models", get(list_models))
        .route("/v1/backends", get(list_backends))
        .route("/v1/backends/switch", post(switch_backend))
        .route("/v1/voice-prefs", get(list_voice_prefs))
        .route("/v1/voice-prefs/:voice", post(set_voice_pref))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for GatewayErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from(&self.0);
        let body = Json(ErrorBody::from(&self.0));
        (status, body).into_response()
    }
}

/// Wraps [`GatewayError`] so it can implement [`IntoResponse`] here without
/// running into the orphan rule against `tts-gateway-core`.
struct GatewayErrorResponse(GatewayError);

impl From<GatewayError> for GatewayErrorResponse {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

#[derive(Debug, Deserialize)]
struct CreateSpeechRequest {
    /// Accepted for OpenAI-client compatibility; not semantically used.
    #[allow(dead_code)]
    model: Option<String>,
    voice: String,
    input: String,
    response_format: Option<String>,
    speed: Option<f32>,
    /// Gateway extension beyond the OpenAI surface: forces a single
    /// backend for this request, with no fallback, per the router's
    /// explicit-backend selection rule.
    backend: Option<String>,
}

async fn create_speech(
    State(state): State<AppState>,
    Json(request): Json<CreateSpeechRequest>,
) -> Result<axum::response::Response, GatewayErrorResponse> {
    let started = Instant::now();
    let fingerprint = TextFingerprint::of(&request.input);

    if request.input.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("input text is empty".to_string()).into());
    }
    let speed = match request.speed {
        Some(s) if !(0.25..=4.0).contains(&s) => {
            return Err(GatewayError::InvalidRequest(format!(
                "speed {s} out of range [0.25, 4.0]"
            ))
            .into())
        }
        other => other,
    };

    let response_format = request
        .response_format
        .as_deref()
        .map(FormatHint::parse)
        .unwrap_or(Some(FormatHint::Mp3))
        .ok_or_else(|| {
            GatewayError::InvalidRequest(format!(
                "unsupported response_format {:?}",
                request.response_format
            ))
        })?;

    let explicit_backend = request
        .backend
        .as_deref()
        .map(parse_backend_kind)
        .transpose()?;

    let voice = state.router.resolve_voice(&request.voice)?;
    let profile = state.router.chunking_profile(&voice, explicit_backend);
    let chunker_config = ChunkerConfig::from(&profile);
    let chunks = chunker::chunk(&request.input, &chunker_config)?;

    tracing::info!(
        voice = %voice.name,
        chunks = chunks.len(),
        text = %fingerprint,
        "synthesizing speech"
    );

    // A single chunk passes the caller's requested format straight to the
    // adapter so the short-circuit below can skip both stitcher and
    // transcoder. Multiple chunks always go through WAV, since only PCM
    // survives a crossfade losslessly.
    let adapter_format = if chunks.len() == 1 {
        response_format
    } else {
        FormatHint::Wav
    };

    let concurrency = chunks
        .len()
        .min(profile.max_concurrency)
        .min(state.settings.global_chunk_parallelism)
        .max(1);

    // Cancelled automatically if this handler future is dropped (client
    // disconnect mid-request), so every in-flight adapter call aborts
    // instead of running to completion for no one.
    let cancel_token = CancellationToken::new();
    let _cancel_guard = cancel_token.clone().drop_guard();

    let router = Arc::clone(&state.router);
    let voice = Arc::new(voice);
    let outputs: Vec<Result<SynthesisOutput, GatewayError>> = stream::iter(chunks.into_iter())
        .map(|chunk| {
            let router = Arc::clone(&router);
            let voice = Arc::clone(&voice);
            let cancel_token = cancel_token.clone();
            async move {
                router
                    .synthesize_chunk(
                        &chunk.text,
                        &voice,
                        adapter_format,
                        speed,
                        explicit_backend,
                        &cancel_token,
                    )
                    .await
            }
        })
        // `buffered` (not `buffer_unordered`) runs up to `concurrency` futures
        // concurrently while yielding results in submission order, so
        // reassembly never has to re-sort by chunk index.
        .buffered(concurrency)
        .collect()
        .await;

    let outputs: Vec<SynthesisOutput> = outputs.into_iter().collect::<Result<_, _>>()?;

    // Single chunk, adapter already emitted the requested container: pass
    // its bytes through untouched, skipping both stitcher and transcoder.
    let body = if let [only] = outputs.as_slice() {
        if only.raw_format == response_format {
            only.raw_bytes.clone()
        } else {
            tts_gateway_audio::encode(&only.audio, response_format).await?
        }
    } else {
        let buffers = outputs.into_iter().map(|o| o.audio).collect();
        let stitched = tts_gateway_audio::stitch(buffers, profile.crossfade_ms)?;
        tts_gateway_audio::encode(&stitched, response_format).await?
    };

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis(),
        bytes = body.len(),
        "speech synthesis complete"
    );

    Ok((
        [(header::CONTENT_TYPE, content_type_for(response_format))],
        body,
    )
        .into_response())
}

fn content_type_for(format: FormatHint) -> &'static str {
    match format {
        FormatHint::Wav => "audio/wav",
        FormatHint::Mp3 => "audio/mpeg",
        FormatHint::Flac => "audio/flac",
        FormatHint::Opus => "audio/opus",
    }
}

fn parse_backend_kind(s: &str) -> Result<BackendKind, GatewayError> {
    BackendKind::all()
        .into_iter()
        .find(|k| k.as_str() == s)
        .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown backend {s:?}")))
}

#[derive(Debug, Serialize)]
struct VoiceSummary {
    name: String,
    backend: BackendKind,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct VoicesResponse {
    voices: Vec<VoiceSummary>,
}

async fn list_voices(State(state): State<AppState>) -> Json<VoicesResponse> {
    let voices = state
        .router
        .registry
        .list()
        .into_iter()
        .map(|v| VoiceSummary {
            name: v.name,
            backend: v.backend,
            category: v.category,
        })
        .collect();
    Json(VoicesResponse { voices })
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    id: &'static str,
    object: &'static str,
    owned_by: &'static str,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    object: &'static str,
    data: Vec<ModelEntry>,
}

async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        object: "list",
        data: vec![ModelEntry {
            id: "tts-1",
            object: "model",
            owned_by: "unified-tts-gateway",
        }],
    })
}

#[derive(Debug, Serialize)]
struct BackendStatus {
    backend: BackendKind,
    configured: bool,
    state: &'static str,
    consecutive_failures: u32,
}

#[derive(Debug, Serialize)]
struct BackendsResponse {
    default_backend: BackendKind,
    backends: Vec<BackendStatus>,
}

async fn list_backends(State(state): State<AppState>) -> Json<BackendsResponse> {
    let configured: std::collections::HashSet<_> = state.router.configured_backends().into_iter().collect();
    let backends = state
        .router
        .health_snapshot()
        .into_iter()
        .map(|(kind, record)| BackendStatus {
            backend: kind,
            configured: configured.contains(&kind),
            state: match record.state {
                tts_gateway_router::HealthState::Unknown => "unknown",
                tts_gateway_router::HealthState::Up => "up",
                tts_gateway_router::HealthState::Down => "down",
            },
            consecutive_failures: record.consecutive_failures,
        })
        .collect();
    Json(BackendsResponse {
        default_backend: state.router.default_backend(),
        backends,
    })
}

#[derive(Debug, Deserialize)]
struct SwitchBackendRequest {
    backend: String,
}

async fn switch_backend(
    State(state): State<AppState>,
    Json(request): Json<SwitchBackendRequest>,
) -> Result<StatusCode, GatewayErrorResponse> {
    let kind = parse_backend_kind(&request.backend)?;
    state.router.set_default_backend(kind);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_voice_prefs(State(state): State<AppState>) -> Json<std::collections::HashMap<String, BackendKind>> {
    Json((*state.router.preferences.snapshot()).clone())
}

#[derive(Debug, Deserialize)]
struct SetVoicePrefRequest {
    backend: String,
}

async fn set_voice_pref(
    State(state): State<AppState>,
    Path(voice): Path<String>,
    Json(request): Json<SetVoicePrefRequest>,
) -> Result<StatusCode, GatewayErrorResponse> {
    let kind = parse_backend_kind(&request.backend)?;
    state.router.preferences.set(voice, kind)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: BackendKind,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.router.default_backend(),
    })
}
