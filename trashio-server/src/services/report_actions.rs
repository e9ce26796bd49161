//! Submitter, worker and administrator operations on reports
//!
//! Actor ids come in with each request; there is no session layer. Every
//! write goes through the controller's guarded commit, so an action racing
//! another change on the same report fails with `Conflict`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use trashio_common::{Error, Result};
use uuid::Uuid;

use super::effects::SideEffect;
use super::lifecycle::{approval_effects, EvaluationOutcome, LifecycleController, Transition};
use crate::db;
use crate::db::reports::ReportFilter;
use crate::models::{GeoPoint, Payment, Report, ReportStatus, Role, User};

pub const ADMIN_REJECT_REASON: &str = "Rejected by admin";
pub const ADMIN_CLEANING_REJECT_REASON: &str = "Cleaning rejected by admin.";
pub const ADMIN_STATUS_REASON: &str = "Updated by admin";

const MAX_REASON_CHARS: usize = 200;

/// New report from a citizen
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    pub citizen_id: Uuid,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub before_image_url: String,
    #[serde(default)]
    pub before_image_thumb_url: Option<String>,
}

/// Proof-of-cleaning upload from the assigned worker
#[derive(Debug, Clone, Deserialize)]
pub struct CleaningSubmission {
    pub worker_id: Uuid,
    pub after_image_url: String,
    #[serde(default)]
    pub after_image_thumb_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

/// Administrator decision on a submission or a cleaning
#[derive(Debug, Clone, Deserialize)]
pub struct AdminReview {
    pub admin_id: Uuid,
    pub action: ReviewAction,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminAssignment {
    pub admin_id: Uuid,
    pub worker_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusOverride {
    pub admin_id: Uuid,
    pub status: ReportStatus,
}

/// Re-evaluation result
#[derive(Debug, Clone, Serialize)]
pub struct Reevaluation {
    /// False when scoring was unavailable and nothing changed
    pub evaluated: bool,
    pub report: Report,
}

pub struct ReportActions {
    db: SqlitePool,
    controller: Arc<LifecycleController>,
}

impl ReportActions {
    pub fn new(db: SqlitePool, controller: Arc<LifecycleController>) -> Self {
        Self { db, controller }
    }

    /// Create a `Pending` report and run the automated review at once
    ///
    /// The report is returned in whatever state the pipeline left it; a
    /// pipeline failure is logged, never surfaced.
    pub async fn submit_report(&self, new: NewReport) -> Result<Report> {
        let description = new.description.trim().to_string();
        let len = description.chars().count();
        if !(3..=500).contains(&len) {
            return Err(Error::InvalidInput("description must be 3-500 characters".to_string()));
        }
        let location = GeoPoint::new(new.lat, new.lng);
        if !location.is_valid() {
            return Err(Error::InvalidInput(format!(
                "location ({}, {}) out of range",
                new.lat, new.lng
            )));
        }
        let before_image_url = non_blank(&new.before_image_url, "before_image_url")?;
        self.require_actor(new.citizen_id, Role::Citizen).await?;

        let report = Report::new(
            new.citizen_id,
            description,
            location,
            before_image_url,
            new.before_image_thumb_url.filter(|u| !u.trim().is_empty()),
        );
        db::reports::insert_report(&self.db, &report).await?;
        tracing::info!(report_id = %report.id, citizen_id = %report.citizen_id, "Report submitted");

        let outcome = self.controller.evaluate_new_submission(report.id).await;
        self.settle(report.id, outcome).await
    }

    /// A citizen's own reports, newest first
    pub async fn list_citizen_reports(&self, citizen_id: Uuid) -> Result<Vec<Report>> {
        db::reports::list_reports(
            &self.db,
            &ReportFilter {
                citizen_id: Some(citizen_id),
                ..Default::default()
            },
        )
        .await
    }

    /// Reports currently held by a worker, newest first
    pub async fn list_worker_reports(&self, worker_id: Uuid) -> Result<Vec<Report>> {
        db::reports::list_reports(
            &self.db,
            &ReportFilter {
                assigned_worker_id: Some(worker_id),
                ..Default::default()
            },
        )
        .await
    }

    /// Record the worker's after-image and run the cleaning review
    pub async fn submit_cleaning(&self, report_id: Uuid, submission: CleaningSubmission) -> Result<Report> {
        let report = db::reports::require_report(&self.db, report_id).await?;
        if report.assigned_worker_id != Some(submission.worker_id) {
            return Err(Error::Forbidden(format!(
                "worker {} is not assigned to report {report_id}",
                submission.worker_id
            )));
        }
        if report.status != ReportStatus::Assigned {
            return Err(Error::Conflict(format!(
                "only Assigned reports can be cleaned (report is {})",
                report.status
            )));
        }
        let after_image_url = non_blank(&submission.after_image_url, "after_image_url")?;

        let mut next = report.clone();
        next.status = ReportStatus::Cleaned;
        next.after_image_url = Some(after_image_url);
        next.after_image_thumb_url = submission.after_image_thumb_url.filter(|u| !u.trim().is_empty());
        next.cleaned_at = Some(Utc::now());
        next.reclean_required = false;

        self.controller
            .commit(Transition {
                from: ReportStatus::Assigned,
                report: next,
                effects: Vec::new(),
            })
            .await?;
        tracing::info!(report_id = %report_id, worker_id = %submission.worker_id, "Cleaning submitted");

        let outcome = self.controller.evaluate_cleaning_submission(report_id).await;
        self.settle(report_id, outcome).await
    }

    /// All reports, optionally by status, newest first
    pub async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        db::reports::list_reports(
            &self.db,
            &ReportFilter {
                status,
                ..Default::default()
            },
        )
        .await
    }

    /// Administrator review of a `Pending` report
    pub async fn admin_verify(&self, report_id: Uuid, review: AdminReview) -> Result<Report> {
        self.require_actor(review.admin_id, Role::Admin).await?;
        let reason = review_reason(review.reason.as_deref())?;
        let report = self.require_status(report_id, ReportStatus::Pending, "verified").await?;

        let now = Utc::now();
        let mut next = report.clone();
        next.ai_locked = false;
        next.verified_by_admin_id = Some(review.admin_id);
        next.verified_by_automation = false;
        next.verified_at = Some(now);

        let effects = match review.action {
            ReviewAction::Approve => {
                next.set_status(ReportStatus::Verified, ADMIN_REJECT_REASON);
                vec![SideEffect::report_approved_by_admin(report.citizen_id, report.id, next.status)]
            }
            ReviewAction::Reject => {
                let reason = reason.unwrap_or_else(|| ADMIN_REJECT_REASON.to_string());
                next.rejected_reason = Some(reason.clone());
                next.set_status(ReportStatus::Rejected, ADMIN_REJECT_REASON);
                vec![SideEffect::report_rejected(report.citizen_id, report.id, &reason)]
            }
        };

        self.commit(report.status, next, effects).await
    }

    /// Hand a `Verified` report to a specific worker
    pub async fn admin_assign(&self, report_id: Uuid, assignment: AdminAssignment) -> Result<Report> {
        self.require_actor(assignment.admin_id, Role::Admin).await?;
        let report = self.require_status(report_id, ReportStatus::Verified, "assigned").await?;

        let worker = db::users::load_user(&self.db, assignment.worker_id)
            .await?
            .filter(|u| u.role == Role::Worker && u.is_active)
            .ok_or_else(|| Error::NotFound(format!("active worker {}", assignment.worker_id)))?;

        let mut next = report.clone();
        next.status = ReportStatus::Assigned;
        next.ai_locked = false;
        next.assigned_worker_id = Some(worker.id);
        next.assigned_by_admin_id = Some(assignment.admin_id);
        next.assigned_by_automation = false;
        next.assigned_at = Some(Utc::now());

        let effects = vec![SideEffect::task_assigned(
            worker.id,
            report.id,
            report.priority.map(|p| p.as_str()),
        )];
        self.commit(report.status, next, effects).await
    }

    /// Administrator review of a `Cleaned` report
    ///
    /// Approval issues the same payments and notices as an automated one.
    pub async fn admin_verify_cleaning(&self, report_id: Uuid, review: AdminReview) -> Result<Report> {
        self.require_actor(review.admin_id, Role::Admin).await?;
        let reason = review_reason(review.reason.as_deref())?;
        let report = self.require_status(report_id, ReportStatus::Cleaned, "cleaning-verified").await?;

        let mut next = report.clone();
        next.ai_locked = false;
        next.cleaning_verified_by_admin_id = Some(review.admin_id);
        next.cleaning_verified_by_automation = false;
        next.cleaning_verified_at = Some(Utc::now());

        let effects = match review.action {
            ReviewAction::Approve => {
                next.status = ReportStatus::Approved;
                next.reclean_required = false;
                approval_effects(&next, &self.controller.config().rewards)
            }
            ReviewAction::Reject => {
                next.status = ReportStatus::Assigned;
                next.clear_after_image();
                let reason = reason.unwrap_or_else(|| ADMIN_CLEANING_REJECT_REASON.to_string());
                next.assigned_worker_id
                    .map(|worker_id| vec![SideEffect::cleaning_rejected(worker_id, report.id, &reason)])
                    .unwrap_or_default()
            }
        };

        self.commit(report.status, next, effects).await
    }

    /// Force any status; `rejected_reason` follows the status
    pub async fn admin_override_status(&self, report_id: Uuid, request: StatusOverride) -> Result<Report> {
        self.require_actor(request.admin_id, Role::Admin).await?;
        let report = db::reports::require_report(&self.db, report_id).await?;

        let mut next = report.clone();
        next.ai_locked = false;
        next.set_status(request.status, ADMIN_STATUS_REASON);
        tracing::info!(
            report_id = %report_id,
            from = %report.status,
            to = %request.status,
            off_graph = !report.status.can_transition_to(request.status),
            admin_id = %request.admin_id,
            "Status overridden by admin"
        );

        self.commit(report.status, next, Vec::new()).await
    }

    /// Re-run the automated stage a report is waiting in
    pub async fn reevaluate(&self, report_id: Uuid) -> Result<Reevaluation> {
        let report = db::reports::require_report(&self.db, report_id).await?;
        let outcome = match report.status {
            ReportStatus::Pending => self.controller.evaluate_new_submission(report_id).await?,
            ReportStatus::Cleaned => self.controller.evaluate_cleaning_submission(report_id).await?,
            other => {
                return Err(Error::Conflict(format!(
                    "report {report_id} is {other}; only Pending or Cleaned reports are evaluated"
                )))
            }
        };

        Ok(Reevaluation {
            evaluated: outcome.was_applied(),
            report: outcome.into_report(),
        })
    }

    pub async fn list_payments(&self, report_id: Uuid) -> Result<Vec<Payment>> {
        db::reports::require_report(&self.db, report_id).await?;
        db::payments::list_for_report(&self.db, report_id).await
    }

    /// The actor must exist, be active and hold `role`
    async fn require_actor(&self, user_id: Uuid, role: Role) -> Result<User> {
        let user = db::users::require_user(&self.db, user_id).await?;
        if user.role != role || !user.is_active {
            return Err(Error::Forbidden(format!("user {user_id} is not an active {role}")));
        }
        Ok(user)
    }

    async fn require_status(&self, report_id: Uuid, status: ReportStatus, verb: &str) -> Result<Report> {
        let report = db::reports::require_report(&self.db, report_id).await?;
        if report.status != status {
            return Err(Error::Conflict(format!(
                "only {status} reports can be {verb} (report is {})",
                report.status
            )));
        }
        Ok(report)
    }

    async fn commit(&self, from: ReportStatus, report: Report, effects: Vec<SideEffect>) -> Result<Report> {
        let (report, _) = self
            .controller
            .commit(Transition { from, report, effects })
            .await?;
        Ok(report)
    }

    /// Swallow a pipeline failure and return the report as stored
    async fn settle(&self, report_id: Uuid, outcome: Result<EvaluationOutcome>) -> Result<Report> {
        match outcome {
            Ok(outcome) => Ok(outcome.into_report()),
            Err(e) => {
                tracing::warn!(report_id = %report_id, error = %e, "Automated review did not run");
                db::reports::require_report(&self.db, report_id).await
            }
        }
    }
}

fn non_blank(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn review_reason(reason: Option<&str>) -> Result<Option<String>> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if let Some(reason) = reason {
        if reason.chars().count() > MAX_REASON_CHARS {
            return Err(Error::InvalidInput(format!(
                "reason must be at most {MAX_REASON_CHARS} characters"
            )));
        }
    }
    Ok(reason.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_reason_trims_and_bounds() {
        assert_eq!(review_reason(Some("  ")).unwrap(), None);
        assert_eq!(review_reason(Some(" blurry ")).unwrap().as_deref(), Some("blurry"));
        assert!(review_reason(Some(&"x".repeat(201))).is_err());
    }

    #[test]
    fn test_review_action_wire_format() {
        let action: ReviewAction = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(action, ReviewAction::Reject);
    }
}
