//! kv_cache server binary
//!
//! Loads configuration, opens the durable store and serves the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kv_cache::api::create_router;
use kv_cache::config::load_env_file;
use kv_cache::{spawn_stats_reporter, AppState, Config, FileStore, MemoryStore, PersistentStore};

/// Main entry point for the kv_cache server.
///
/// # Startup Sequence
/// 1. Load `.env` and initialize the tracing subscriber
/// 2. Load configuration from flags, falling back to environment variables
/// 3. Build the runtime with the configured worker count
/// 4. Open the durable store and build the sharded cache
/// 5. Start the stats reporter and serve until SIGINT/SIGTERM
fn main() -> anyhow::Result<()> {
    let env_file = load_env_file(".env");

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kv_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = env_file {
        warn!("No .env file loaded: {}", e);
    }

    let config = Config::from_args();
    info!(
        "Configuration loaded: cache_size={}, shards={}, workers={}, port={}, stats_interval={}s, request_timeout={}s",
        config.cache_size,
        config.shard_count,
        config.worker_threads,
        config.server_port,
        config.stats_interval,
        config.request_timeout
    );

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(serve(config))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn PersistentStore> = match &config.store_path {
        Some(path) => {
            let store = FileStore::open(path, config.store_fsync)
                .with_context(|| format!("failed to open store at {}", path.display()))?;
            store
                .compact()
                .with_context(|| format!("failed to compact store at {}", path.display()))?;
            info!("File store opened at {} ({} keys)", path.display(), store.len());
            Arc::new(store)
        }
        None => {
            warn!("STORE_PATH not set, using in-memory store; data will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::from_config(&config, store);
    info!(
        "Sharded cache initialized: {} shards, capacity {}",
        state.kv.cache().shard_count(),
        state.kv.cache().capacity()
    );

    let stats_handle = spawn_stats_reporter(state.kv.clone(), config.stats_interval);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(stats_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the stats
/// reporter.
async fn shutdown_signal(stats_handle: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    stats_handle.abort();
    warn!("Stats reporter aborted");
}
