//! Administrator endpoints
//!
//! Human overrides of the automated lifecycle. Each one clears `ai_locked`.

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{Payment, Report, ReportStatus};
use crate::services::report_actions::{
    AdminAssignment, AdminReview, Reevaluation, StatusOverride,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<ReportStatus>,
}

/// GET /admin/reports?status=
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.actions.list_reports(query.status).await?))
}

/// POST /admin/reports/:report_id/verify
pub async fn verify_report(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(review): Json<AdminReview>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.actions.admin_verify(report_id, review).await?))
}

/// POST /admin/reports/:report_id/assign
pub async fn assign_worker(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(assignment): Json<AdminAssignment>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.actions.admin_assign(report_id, assignment).await?))
}

/// POST /admin/reports/:report_id/verify-cleaning
pub async fn verify_cleaning(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(review): Json<AdminReview>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.actions.admin_verify_cleaning(report_id, review).await?))
}

/// PATCH /admin/reports/:report_id/status
pub async fn override_status(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Json(request): Json<StatusOverride>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.actions.admin_override_status(report_id, request).await?))
}

/// POST /admin/reports/:report_id/reevaluate
pub async fn reevaluate(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Json<Reevaluation>> {
    Ok(Json(state.actions.reevaluate(report_id).await?))
}

/// GET /admin/reports/:report_id/payments
pub async fn list_payments(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(state.actions.list_payments(report_id).await?))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/reports", get(list_reports))
        .route("/admin/reports/:report_id/verify", post(verify_report))
        .route("/admin/reports/:report_id/assign", post(assign_worker))
        .route("/admin/reports/:report_id/verify-cleaning", post(verify_cleaning))
        .route("/admin/reports/:report_id/status", patch(override_status))
        .route("/admin/reports/:report_id/reevaluate", post(reevaluate))
        .route("/admin/reports/:report_id/payments", get(list_payments))
}
