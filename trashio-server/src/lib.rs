//! trashio-server library interface
//!
//! Report service: stores reports, drives them through the automated
//! review lifecycle (scoring via trashio-ai), assigns field workers and
//! issues notifications and payments.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::http::HeaderValue;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::{LifecycleConfig, LifecycleController, ReportActions, ScoringService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub actions: Arc<ReportActions>,
    /// Served read-only under `/uploads`
    pub upload_dir: PathBuf,
    /// Allowed browser origins
    pub cors_origins: Arc<Vec<String>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        scoring: Arc<dyn ScoringService>,
        lifecycle: LifecycleConfig,
        cors_origins: Vec<String>,
    ) -> Self {
        let upload_dir = lifecycle.upload_dir.clone();
        let controller = Arc::new(LifecycleController::new(db.clone(), scoring, lifecycle));

        Self {
            actions: Arc::new(ReportActions::new(db.clone(), controller)),
            db,
            upload_dir,
            cors_origins: Arc::new(cors_origins),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);
    let uploads = ServeDir::new(&state.upload_dir);

    Router::new()
        .merge(api::report_routes())
        .merge(api::worker_routes())
        .merge(api::admin_routes())
        .merge(api::user_routes())
        .merge(api::health_routes())
        .nest_service("/uploads", uploads)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
