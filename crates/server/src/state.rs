//! Shared application state, built once at startup and cloned (cheaply,
//! via `Arc`) into every request handler.

use std::sync::Arc;

use tts_gateway_adapters::build_adapters;
use tts_gateway_config::Settings;
use tts_gateway_router::Router;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub async fn new(settings: Settings) -> Self {
        let adapters = build_adapters(&settings);
        let router = Router::new(&settings, adapters);

        let backend_reported = router.query_voice_catalogs().await;
        if let Err(e) = router.registry.reload(&backend_reported) {
            tracing::warn!(error = %e, "initial voice registry scan failed, starting with an empty catalog");
        }

        Self {
            router: Arc::new(router),
            settings: Arc::new(settings),
        }
    }
}
