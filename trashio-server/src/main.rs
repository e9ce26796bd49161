//! trashio-server - Cleanup report service
//!
//! Accepts citizen reports, runs them through automated review against the
//! trashio-ai scoring service, routes approved work to field workers and
//! pays out on verified cleanings.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use trashio_common::config::{load_toml_config, resolve_config_path, CONFIG_ENV_VAR};
use trashio_common::logging::{apply_logging_config, init_tracing};
use trashio_server::config::ServerConfig;
use trashio_server::services::{HttpScoringClient, LifecycleConfig};
use trashio_server::{build_router, db, AppState};

#[derive(Debug, Parser)]
#[command(name = "trashio-server", version, about = "Trashio report service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Bind address (overrides config file)
    #[arg(long, env = "TRASHIO_HOST")]
    host: Option<String>,

    /// Listen port (overrides config file)
    #[arg(long, env = "TRASHIO_PORT")]
    port: Option<u16>,

    /// SQLite database file (overrides config file)
    #[arg(long, env = "TRASHIO_DATABASE_PATH")]
    database_path: Option<PathBuf>,

    /// Scoring service base URL (overrides config file)
    #[arg(long, env = "TRASHIO_SCORING_URL")]
    scoring_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_filter = init_tracing("trashio_server");

    let config_path = resolve_config_path(args.config.as_deref(), "trashio-server");
    let mut config: ServerConfig = load_toml_config(config_path.as_deref())?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database_path) = args.database_path {
        config.database_path = database_path;
    }
    if let Some(scoring_url) = args.scoring_url {
        config.scoring.url = scoring_url;
    }
    config.validate()?;

    apply_logging_config(&log_filter, &config.logging, "trashio_server")?;

    info!("Starting trashio-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());
    info!("Scoring service: {}", config.scoring.url);

    config.prepare_upload_dir()?;
    info!("Uploads: {}", config.upload_dir.display());

    let pool = db::init_database_pool(&config.database_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let scoring = HttpScoringClient::new(&config.scoring.url, config.scoring.timeout())
        .context("Failed to build scoring client")?;

    let lifecycle = LifecycleConfig {
        scoring_timeout: config.scoring.timeout(),
        rewards: config.rewards.clone(),
        upload_dir: config.upload_dir.clone(),
    };
    let state = AppState::new(pool, Arc::new(scoring), lifecycle, config.cors_origins.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("trashio-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
