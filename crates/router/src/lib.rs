//! Voice catalog, backend health tracking, and synthesis routing.

pub mod health;
pub mod preferences;
pub mod registry;
#[allow(clippy::module_inception)]
mod router;

pub use health::{BackendHealth, HealthRecord, HealthState};
pub use preferences::VoicePreferences;
pub use registry::VoiceRegistry;
pub use router::Router;
