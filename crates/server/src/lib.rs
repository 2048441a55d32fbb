//! Unified Text-to-Speech Gateway
//!
//! HTTP entry point exposing an OpenAI-compatible speech endpoint in front
//! of five different upstream TTS protocol families.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;
