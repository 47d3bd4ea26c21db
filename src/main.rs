//! Product Catalog - a cached REST API over a product document store
//!
//! # Startup Sequence
//! 1. Load `.env` and initialize tracing
//! 2. Load configuration from environment variables
//! 3. Connect the configured repository backend
//! 4. Start the background cleanup task
//! 5. Serve HTTP until SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use product_catalog::config::StoreBackend;
use product_catalog::repository::{
    connect, InMemoryProductRepository, MongoProductRepository, ProductRepository,
};
use product_catalog::{create_router, spawn_cleanup_task, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "product_catalog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Product Catalog API");

    let config = Config::from_env();
    info!(
        "Configuration loaded: environment={}, backend={:?}, port={}, cache_ttl={}s, cache_max_entries={}",
        config.environment,
        config.store_backend,
        config.server_port,
        config.cache_ttl,
        config.cache_max_entries
    );

    let repository = build_repository(&config).await?;

    let cleanup_interval = config.cleanup_interval;
    let port = config.server_port;
    let state = AppState::new(config, repository);

    let cleanup_handle =
        spawn_cleanup_task(state.cache.clone(), state.limiter.clone(), cleanup_interval);
    info!("Background cleanup task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Connection info feeds the per-client rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cleanup_handle))
    .await
    .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn ProductRepository>> {
    match config.store_backend {
        StoreBackend::MongoDb => {
            let db = connect(config)
                .await
                .context("failed to connect to MongoDB")?;
            let repository = MongoProductRepository::new(&db, &config.mongo_collection);
            repository
                .ensure_indexes()
                .await
                .context("failed to create product indexes")?;
            Ok(Arc::new(repository))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryProductRepository::new()))
        }
    }
}

/// Waits for Ctrl+C or SIGTERM, then stops the cleanup task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
