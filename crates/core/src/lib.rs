//! Shared types and traits for the unified TTS gateway.
//!
//! This crate provides the foundational types used across every other
//! crate in the workspace:
//! - Voice catalog types (`Voice`, `BackendKind`)
//! - Backend capability records (`BackendProfile`)
//! - The uniform synthesis contract (`SynthesisAdapter`)
//! - Audio and text-chunk types shared by the chunker, adapters, and stitcher
//! - The pipeline-wide error taxonomy (`GatewayError`)

pub mod adapter;
pub mod audio;
pub mod chunk;
pub mod error;
pub mod profile;
pub mod redact;
pub mod voice;

pub use adapter::{FormatHint, SynthesisAdapter};
pub use audio::AudioBuffer;
pub use chunk::Chunk;
pub use error::GatewayError;
pub use profile::BackendProfile;
pub use voice::{BackendKind, Voice};

/// Convenience result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, GatewayError>;
