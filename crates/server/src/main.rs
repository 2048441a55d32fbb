//! Unified TTS Gateway — binary entry point.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use tts_gateway_config::Settings;
use tts_gateway_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting unified-tts-gateway");
    tracing::info!(
        default_backend = %settings.default_backend,
        configured_backends = settings.backends.len(),
        "configuration loaded"
    );

    let metrics_handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("initialized Prometheus metrics at /metrics");

    let state = AppState::new(settings.clone()).await;
    tracing::info!(
        voices = state.router.registry.len(),
        "voice catalog initialized"
    );

    let app = create_router(state).route(
        "/metrics",
        axum::routing::get(move || std::future::ready(metrics_handle.render())),
    );

    let addr: SocketAddr = settings.bind_addr().parse()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

/// JSON logs when `UNIFIED_TTS_LOG_JSON=1`, human-readable otherwise.
/// Verbosity controlled by `RUST_LOG` per spec.md §6.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "unified_tts_gateway=info,tower_http=info".into());

    let json = std::env::var("UNIFIED_TTS_LOG_JSON")
        .map(|v| v == "1")
        .unwrap_or(false);

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
