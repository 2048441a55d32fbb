//! Environment-driven configuration for the TTS gateway.
//!
//! The gateway takes no config files — every knob is an environment
//! variable, per spec.md §6. This module's job mirrors the teacher's
//! `Settings`/`ConfigError` split: a typed `Settings` struct built once at
//! startup via [`Settings::from_env`], with defaults baked in so a bare
//! `cargo run` with no environment produces a usable (if empty-of-backends)
//! gateway.

pub mod settings;

pub use settings::{BackendEndpoint, Settings};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}
