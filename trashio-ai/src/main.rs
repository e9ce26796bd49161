//! trashio-ai - Image heuristic scoring service
//!
//! Scores before-images for trash likelihood and compares before/after
//! pairs to judge cleanings. Stateless; the report service is its only
//! caller.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use trashio_ai::config::AiServiceConfig;
use trashio_ai::{build_router, AppState};
use trashio_common::config::{load_toml_config, resolve_config_path, CONFIG_ENV_VAR};
use trashio_common::logging::{apply_logging_config, init_tracing};

#[derive(Debug, Parser)]
#[command(name = "trashio-ai", version, about = "Trashio image scoring service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Bind address (overrides config file)
    #[arg(long, env = "TRASHIO_AI_HOST")]
    host: Option<String>,

    /// Listen port (overrides config file)
    #[arg(long, env = "TRASHIO_AI_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_filter = init_tracing("trashio_ai");

    let config_path = resolve_config_path(args.config.as_deref(), "trashio-ai");
    let mut config: AiServiceConfig = load_toml_config(config_path.as_deref())?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.analyzer.validate()?;

    apply_logging_config(&log_filter, &config.logging, "trashio_ai")?;

    info!("Starting trashio-ai v{}", env!("CARGO_PKG_VERSION"));

    let http_client = reqwest::Client::builder()
        .timeout(config.fetch_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let state = AppState::new(config.analyzer.clone(), http_client, config.max_image_bytes);
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

    info!("trashio-ai stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
