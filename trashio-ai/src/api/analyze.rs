//! Analysis API handlers
//!
//! POST /analyze/before, POST /analyze/after

use axum::{extract::State, routing::post, Json, Router};
use trashio_common::scoring::{
    AfterAnalysisRequest, AfterAnalysisResponse, BeforeAnalysisRequest, BeforeAnalysisResponse,
};

use crate::{
    analyzer,
    error::{ApiError, ApiResult},
    image_source::{load_image, ImageSource},
    AppState,
};

/// POST /analyze/before
///
/// Score a before-image for trash likelihood and fingerprint it.
pub async fn analyze_before(
    State(state): State<AppState>,
    Json(request): Json<BeforeAnalysisRequest>,
) -> ApiResult<Json<BeforeAnalysisResponse>> {
    let source = ImageSource::from_parts(request.image_path.as_deref(), request.image_url.as_deref())?;
    let image = load_image(&source, &state.http_client, state.max_image_bytes).await?;

    let config = state.analyzer.clone();
    let response = tokio::task::spawn_blocking(move || analyzer::analyze_before(&image, &config))
        .await
        .map_err(|e| ApiError::Internal(format!("Analysis task failed: {e}")))?;

    tracing::info!(
        report_id = %request.report_id,
        decision = ?response.decision,
        severity = response.severity,
        priority = %response.priority,
        "Before-image analyzed"
    );

    Ok(Json(response))
}

/// POST /analyze/after
///
/// Compare before/after images to judge whether cleaning happened.
pub async fn analyze_after(
    State(state): State<AppState>,
    Json(request): Json<AfterAnalysisRequest>,
) -> ApiResult<Json<AfterAnalysisResponse>> {
    let before_source = ImageSource::from_parts(
        request.before_image_path.as_deref(),
        request.before_image_url.as_deref(),
    )?;
    let after_source = ImageSource::from_parts(
        request.after_image_path.as_deref(),
        request.after_image_url.as_deref(),
    )?;

    let (before, after) = tokio::try_join!(
        load_image(&before_source, &state.http_client, state.max_image_bytes),
        load_image(&after_source, &state.http_client, state.max_image_bytes),
    )?;

    let config = state.analyzer.clone();
    let response =
        tokio::task::spawn_blocking(move || analyzer::analyze_after(&before, &after, &config))
            .await
            .map_err(|e| ApiError::Internal(format!("Analysis task failed: {e}")))?;

    tracing::info!(
        report_id = %request.report_id,
        decision = ?response.decision,
        diff_score = response.diff_score,
        after_trash_score = response.after_trash_score,
        "After-image analyzed"
    );

    Ok(Json(response))
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze/before", post(analyze_before))
        .route("/analyze/after", post(analyze_after))
}
