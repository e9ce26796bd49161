//! Submitter endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::db;
use crate::error::ApiResult;
use crate::models::Report;
use crate::services::report_actions::NewReport;
use crate::AppState;

/// POST /reports
///
/// Always 201 once the report is stored, whether or not scoring ran.
pub async fn create_report(
    State(state): State<AppState>,
    Json(request): Json<NewReport>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let report = state.actions.submit_report(request).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /reports/:report_id
pub async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Json<Report>> {
    Ok(Json(db::reports::require_report(&state.db, report_id).await?))
}

/// GET /citizens/:citizen_id/reports
pub async fn list_citizen_reports(
    State(state): State<AppState>,
    Path(citizen_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.actions.list_citizen_reports(citizen_id).await?))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports", post(create_report))
        .route("/reports/:report_id", get(get_report))
        .route("/citizens/:citizen_id/reports", get(list_citizen_reports))
}
