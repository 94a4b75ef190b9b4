//! sentinel-api - HTTP service for the Sentinel personal-safety app
//!
//! Resolves configuration, opens the selected storage backend, seeds sample
//! safe zones into an empty store and serves the JSON API until SIGINT or
//! SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_api::{build_router, AppState};
use sentinel_common::config::{
    default_config_path, load_toml_config, RootFolderInitializer, RootFolderResolver,
    StorageBackend, TomlConfig,
};
use sentinel_common::db::init_database;
use sentinel_common::seed::seed_safe_zones;
use sentinel_common::{MemStorage, SqliteStorage, Storage};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for sentinel-api
#[derive(Parser, Debug)]
#[command(name = "sentinel-api")]
#[command(about = "Personal-safety backend: emergency contacts, incidents, SOS alerts, safe zones")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SENTINEL_PORT")]
    port: Option<u16>,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Root folder for the database (overrides SENTINEL_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Storage backend: sqlite or memory
    #[arg(short, long, env = "SENTINEL_STORAGE")]
    storage: Option<StorageBackend>,

    /// TOML configuration file
    #[arg(short, long, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Skip inserting sample safe zones
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The log level lives in the config file, so it is read before tracing starts
    let config_path = args.config.clone().or_else(default_config_path);
    let config = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load configuration")?,
        None => TomlConfig::default(),
    };

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str())),
        )
        .init();

    // Build identification first, before any database work
    info!(
        "Starting Sentinel API (sentinel-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_path {
        Some(path) if path.exists() => info!("Configuration: {}", path.display()),
        Some(path) => warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        ),
        None => warn!("No config directory on this platform, using built-in defaults"),
    }

    let storage = open_storage(&args, &config).await?;
    info!("Storage backend: {}", storage.backend());

    if config.seed_sample_data && !args.no_seed {
        seed_safe_zones(storage.as_ref())
            .await
            .context("Failed to seed sample safe zones")?;
    }

    let app = build_router(AppState::new(storage));

    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", host, port);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn open_storage(args: &Args, config: &TomlConfig) -> Result<Arc<dyn Storage>> {
    let backend = args.storage.unwrap_or(config.storage);

    if backend == StorageBackend::Memory {
        warn!("Using in-memory storage: all data is lost on shutdown");
        return Ok(Arc::new(MemStorage::new()));
    }

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_toml_root(config.root_folder.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = config.database_path_in(initializer.root_folder());
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    Ok(Arc::new(SqliteStorage::new(pool)))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
