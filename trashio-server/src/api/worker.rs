//! Field worker endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::Report;
use crate::services::report_actions::CleaningSubmission;
use crate::AppState;

/// GET /workers/:worker_id/reports
pub async fn list_assigned(
    State(state): State<AppState>,
    Path(worker_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.actions.list_worker_reports(worker_id).await?))
}

/// POST /reports/:report_id/cleaning
///
/// 200 with the report as the cleaning review left it.
pub async fn submit_cleaning(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(request): Json<CleaningSubmission>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.actions.submit_cleaning(report_id, request).await?))
}

pub fn worker_routes() -> Router<AppState> {
    Router::new()
        .route("/workers/:worker_id/reports", get(list_assigned))
        .route("/reports/:report_id/cleaning", post(submit_cleaning))
}
