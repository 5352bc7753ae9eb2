//! HTTP server: state wiring, startup and graceful shutdown.

pub mod handlers;
pub mod protocol;
pub mod routes;

use crate::config::Config;
use crate::error::{Result, VoxError};
use crate::jobs::JobOrchestrator;
use crate::storage::{BlobStore, FsBlobStore, MemoryBlobStore};
use crate::stt::{ScriptedTranscriber, Transcriber};
use crate::tts::{SynthesisEngine, Synthesizer, ToneSynthesizer};
use crate::voices::VoiceCatalog;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use routes::router;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: JobOrchestrator,
    pub catalog: Arc<VoiceCatalog>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire up state from explicit parts.
    pub fn new(
        config: &Config,
        store: Arc<dyn BlobStore>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        let catalog = Arc::new(VoiceCatalog::with_builtins());
        let engine = Arc::new(SynthesisEngine::new(
            synthesizer,
            catalog.clone(),
            store.clone(),
            config.synthesis.max_text_chars,
        ));
        let orchestrator =
            JobOrchestrator::new(store, transcriber, engine, config.request_timeout());
        Self {
            orchestrator,
            catalog,
            max_upload_bytes: config.storage.max_upload_bytes,
        }
    }
}

/// Build the default state for `config` and render preset previews.
pub async fn build_state(config: &Config) -> Result<AppState> {
    config.validate()?;

    let max_bytes = config.storage.max_upload_bytes;
    let store: Arc<dyn BlobStore> = if config.storage.in_memory {
        tracing::info!("Using in-memory blob store");
        Arc::new(MemoryBlobStore::new(max_bytes))
    } else {
        let dir = config.storage_dir();
        tracing::info!(dir = %dir.display(), "Using filesystem blob store");
        Arc::new(FsBlobStore::open(dir, max_bytes).await?)
    };
    let transcriber = Arc::new(ScriptedTranscriber::new(config.transcription.clone()));
    let synthesizer = Arc::new(ToneSynthesizer::new(config.synthesis.sample_rate));

    let state = AppState::new(config, store, transcriber, synthesizer);
    let previews = state.orchestrator.engine().render_previews().await?;
    tracing::info!(previews, voices = state.catalog.len(), "Voice catalog ready");
    Ok(state)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind the configured address and serve until SIGINT or SIGTERM.
pub async fn run_server(config: Config) -> Result<()> {
    let state = build_state(&config).await?;
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| VoxError::ConfigInvalidValue {
            key: "server.bind".to_string(),
            message: format!("'{}': {}", config.server.bind, e),
        })?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    serve(listener, state, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let sigterm = async {
        if let Err(e) = wait_for_sigterm().await {
            tracing::error!(error = %e, "Failed to listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Failed to listen for SIGINT");
            }
            tracing::info!("Received SIGINT, shutting down");
        }
        _ = sigterm => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| VoxError::Other(format!("Failed to register SIGTERM handler: {}", e)))?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    std::future::pending::<()>().await
}
