//! One [`SynthesisAdapter`](tts_gateway_core::adapter::SynthesisAdapter)
//! implementation per upstream protocol pattern, plus the factory that
//! builds the live set from configuration.

pub mod backends;
pub mod factory;
mod retry;
mod wav;

pub use backends::{
    CloudApiKeyAdapter, EmotionWebSocketAdapter, NeuralRestAdapter, SessionChannelAdapter,
    VoiceCloneMultipartAdapter,
};
pub use factory::{build_adapters, AdapterMap};
