//! Pastebin - paste storage service with expiry and hot-paste caching

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{CacheBackend, CacheConfig, Config, LogFormat, LoggingConfig, StorageBackend, StorageConfig};
use paste_api::{AppState, create_router};
use paste_core::{
    ExpirySweeper, KeyGenerator, MemoryCache, PasteCache, PasteEngine, RedisCache, SweepSchedule,
    spawn_purge_task, spawn_sweep_task,
};
use paste_db::Database;
use paste_storage::{BlobStore, LocalStorage, S3Storage};

/// Pastebin - store, share and expire text snippets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "PASTEBIN_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PASTEBIN_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting Pastebin v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    // Initialize metadata store
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    let db = Arc::new(
        Database::new(&config.database.url())
            .await
            .context("Failed to open metadata database")?,
    );
    info!(
        "Metadata database ready ({} pastes stored)",
        db.get_paste_count().await?
    );

    let blobs = build_blob_store(&config.storage).await?;
    let (cache, purge_task) = build_cache(&config.cache)?;
    let keys = KeyGenerator::new(config.keys.random_length)?;

    let engine = Arc::new(PasteEngine::new(
        db.clone(),
        blobs,
        cache,
        keys,
        config.cache.policy(),
    ));

    let sweep_task = if config.sweeper.enabled {
        let schedule = SweepSchedule::parse(&config.sweeper.schedule)?;
        let sweeper = Arc::new(ExpirySweeper::new(engine.clone(), db));
        Some(spawn_sweep_task(sweeper, schedule))
    } else {
        info!("Expiry sweeper disabled");
        None
    };

    let app = create_router(AppState::new(engine), metrics_handle);

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_addr, port))?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for task in [sweep_task, purge_task].into_iter().flatten() {
        task.abort();
    }

    info!("Server stopped");
    Ok(())
}

/// Build the configured blob store
async fn build_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Local => Arc::new(
            LocalStorage::new(&config.local.path)
                .await
                .context("Failed to initialize local storage")?,
        ),
        StorageBackend::S3 => Arc::new(
            S3Storage::new(config.s3.to_s3_config())
                .await
                .context("Failed to initialize S3 storage")?,
        ),
    };
    Ok(store)
}

/// Build the configured cache backend, plus the purge task the memory
/// backend needs
fn build_cache(config: &CacheConfig) -> Result<(Arc<dyn PasteCache>, Option<JoinHandle<()>>)> {
    match config.backend {
        CacheBackend::Memory => {
            let cache = Arc::new(MemoryCache::new());
            let task = spawn_purge_task(cache.clone(), config.purge_interval());
            Ok((cache, Some(task)))
        }
        CacheBackend::Redis => {
            let cache = RedisCache::new(&config.redis.to_cache_config())
                .context("Failed to initialize Redis cache")?;
            Ok((Arc::new(cache), None))
        }
    }
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
