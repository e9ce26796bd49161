//! trashio-ai library interface
//!
//! Image heuristic analyzer exposed as an HTTP scoring service. The report
//! service calls it to score before-images and before/after pairs.

pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod image_source;

pub use crate::error::{AnalysisError, ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AnalyzerConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable analyzer thresholds, built once at start-up
    pub analyzer: Arc<AnalyzerConfig>,
    /// Client used to fetch http(s) image sources
    pub http_client: reqwest::Client,
    /// Largest image, file or download, accepted for analysis
    pub max_image_bytes: u64,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(analyzer: AnalyzerConfig, http_client: reqwest::Client, max_image_bytes: u64) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            http_client,
            max_image_bytes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
