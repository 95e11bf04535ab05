//! survey-server - HTTP service for the music recommendation survey
//!
//! Zero-config startup: without a config file the service listens on
//! 127.0.0.1:5780, stores submissions in the platform data directory and
//! serves the built-in playlist catalog.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use survey_common::catalog::PlaylistCatalog;
use survey_common::config;
use survey_common::db::init_database;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use survey_server::{build_router, AppState, BUILTIN_CATALOG};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "survey-server", version, about = "Music recommendation survey service")]
struct Args {
    /// Path to config.toml (overrides SURVEY_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Playlist catalog TOML (overrides catalog_path from the config file)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting survey-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {}", config.database_path.display());

    let catalog = match args.catalog.as_ref().or(config.catalog_path.as_ref()) {
        Some(path) => PlaylistCatalog::load(path)
            .with_context(|| format!("Failed to load playlist catalog {}", path.display()))?,
        None => {
            let catalog = PlaylistCatalog::from_toml(BUILTIN_CATALOG)?;
            info!("Using built-in playlist catalog ({} playlists)", catalog.len());
            catalog
        }
    };

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(pool, catalog, config.secure_cookies);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("survey-server listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("survey-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
