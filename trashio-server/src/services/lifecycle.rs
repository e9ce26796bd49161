//! Report lifecycle controller
//!
//! Drives a report through the automated stages:
//!
//! ```text
//! Pending ──score──▶ Rejected
//!    │
//!    └──▶ Verified ──select──▶ Assigned ──upload──▶ Cleaned ──score──▶ Approved
//!                                 ▲                    │
//!                                 └── reclean/reject ──┘
//! ```
//!
//! Each evaluation is: load → score (bounded by a timeout) → duplicate check
//! → plan → guarded write → read back → dispatch side effects. Scoring and
//! duplicate-check failures are absorbed and leave the report where it was.
//! Persistence failures propagate.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use trashio_common::scoring::{AfterAnalysisRequest, BeforeAnalysisRequest, CleaningDecision};
use trashio_common::{Error, Result};
use uuid::Uuid;

use super::assignment::WorkerSelector;
use super::duplicates::DuplicateDetector;
use super::effects::{DispatchReport, EffectExecutor, SideEffect};
use super::image_refs::resolve_image_ref;
use super::scoring_client::{ScoringError, ScoringService};
use super::verdict::{BeforeVerdict, CleaningVerdict, DUPLICATE_AFTER_FLAG};
use crate::config::RewardsConfig;
use crate::db;
use crate::models::{AiDecision, PaymentType, Report, ReportStatus, User};

pub const AI_REJECT_REASON: &str = "Rejected by AI";
pub const AI_CLEANING_REJECT_REASON: &str = "AI rejected the cleaning.";

/// Immutable settings threaded into the controller at construction
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Hard bound on each scoring call
    pub scoring_timeout: Duration,
    pub rewards: RewardsConfig,
    /// Where `/uploads/...` image references live on disk
    pub upload_dir: PathBuf,
}

/// A planned report change plus the effects to run once it commits
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Status the stored report must still have for the write to land
    pub from: ReportStatus,
    pub report: Report,
    pub effects: Vec<SideEffect>,
}

/// Result of an evaluation trigger
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// Scoring was unavailable; the report is unchanged
    Skipped { report: Report, reason: String },
    /// The transition committed and its effects were dispatched
    Applied { report: Report, dispatch: DispatchReport },
}

impl EvaluationOutcome {
    pub fn into_report(self) -> Report {
        match self {
            EvaluationOutcome::Skipped { report, .. } | EvaluationOutcome::Applied { report, .. } => report,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, EvaluationOutcome::Applied { .. })
    }
}

/// Plan the outcome of scoring a new submission
pub fn plan_new_submission(
    report: &Report,
    verdict: BeforeVerdict,
    worker: Option<&User>,
    now: DateTime<Utc>,
) -> Transition {
    let mut next = report.clone();
    next.ai_locked = true;
    next.verified_by_automation = true;
    next.verified_at = Some(now);

    match verdict {
        BeforeVerdict::Reject {
            reason,
            severity,
            priority,
            flags,
            fingerprint,
            ..
        } => {
            next.rejected_reason = Some(reason.clone().unwrap_or_else(|| AI_REJECT_REASON.to_string()));
            next.status = ReportStatus::Rejected;
            next.ai_decision = Some(AiDecision::Reject);
            next.ai_reason = reason;
            next.ai_flags = flags;
            next.before_image_hash = fingerprint;
            next.severity = Some(severity);
            next.priority = Some(priority);

            Transition {
                from: report.status,
                report: next,
                effects: Vec::new(),
            }
        }
        BeforeVerdict::Approve {
            severity,
            priority,
            flags,
            fingerprint,
            ..
        } => {
            next.status = ReportStatus::Verified;
            next.rejected_reason = None;
            next.ai_decision = Some(AiDecision::Approve);
            next.ai_reason = None;
            next.ai_flags = flags;
            next.before_image_hash = fingerprint;
            next.severity = Some(severity);
            next.priority = Some(priority);

            if let Some(worker) = worker {
                next.status = ReportStatus::Assigned;
                next.assigned_worker_id = Some(worker.id);
                next.assigned_by_admin_id = None;
                next.assigned_by_automation = true;
                next.assigned_at = Some(now);
            }

            let mut effects = vec![SideEffect::report_reviewed(
                report.citizen_id,
                report.id,
                next.status,
                worker.is_some(),
            )];
            if let Some(worker) = worker {
                effects.push(SideEffect::task_assigned(
                    worker.id,
                    report.id,
                    next.priority.map(|p| p.as_str()),
                ));
            }

            Transition {
                from: report.status,
                report: next,
                effects,
            }
        }
    }
}

/// Payments and notices for an approved cleaning
///
/// The worker payment is skipped when nobody is assigned; the submitter
/// reward is always issued.
pub fn approval_effects(report: &Report, rewards: &RewardsConfig) -> Vec<SideEffect> {
    let mut effects = Vec::new();

    if let Some(worker_id) = report.assigned_worker_id {
        effects.push(SideEffect::IssuePayment {
            report_id: report.id,
            recipient: worker_id,
            amount: rewards.worker_payment_amount,
            kind: PaymentType::WorkerPayment,
        });
    }
    effects.push(SideEffect::IssuePayment {
        report_id: report.id,
        recipient: report.citizen_id,
        amount: rewards.submitter_reward_amount,
        kind: PaymentType::SubmitterReward,
    });

    effects.push(SideEffect::reward_issued(
        report.citizen_id,
        report.id,
        rewards.submitter_reward_amount,
    ));
    if let Some(worker_id) = report.assigned_worker_id {
        effects.push(SideEffect::payment_issued(worker_id, report.id, rewards.worker_payment_amount));
    }

    effects
}

/// Cleaning accepted with no flags
pub fn plan_cleaning_approval(
    report: &Report,
    verdict: &CleaningVerdict,
    rewards: &RewardsConfig,
    now: DateTime<Utc>,
) -> Transition {
    let mut next = report.clone();
    next.status = ReportStatus::Approved;
    next.ai_decision = Some(AiDecision::Accept);
    next.ai_flags = verdict.flags.clone();
    next.ai_locked = true;
    next.after_image_hash = verdict.after_hash.clone();
    next.cleaning_verified_by_automation = true;
    next.cleaning_verified_at = Some(now);
    next.reclean_required = false;

    Transition {
        from: report.status,
        effects: approval_effects(&next, rewards),
        report: next,
    }
}

/// Partial cleaning: same worker, fresh upload required
pub fn plan_reclean(report: &Report, verdict: &CleaningVerdict) -> Transition {
    let mut next = report.clone();
    next.status = ReportStatus::Assigned;
    next.ai_decision = Some(AiDecision::Reclean);
    next.ai_flags = verdict.flags.clone();
    next.ai_locked = true;
    next.after_image_hash = verdict.after_hash.clone();
    next.reclean_required = true;
    next.clear_after_image();

    let effects = report
        .assigned_worker_id
        .map(|worker_id| vec![SideEffect::reclean_requested(worker_id, report.id)])
        .unwrap_or_default();

    Transition {
        from: report.status,
        report: next,
        effects,
    }
}

/// Rejected cleaning (or an accept vetoed by flags)
///
/// With a replacement the task moves to them; without one it stays with
/// the current worker, who is told the cleaning was rejected.
pub fn plan_cleaning_rejection(
    report: &Report,
    verdict: &CleaningVerdict,
    replacement: Option<&User>,
    now: DateTime<Utc>,
) -> Transition {
    let mut next = report.clone();
    next.status = ReportStatus::Assigned;
    next.ai_decision = Some(AiDecision::Reject);
    next.ai_flags = verdict.flags.clone();
    next.ai_locked = true;
    next.after_image_hash = verdict.after_hash.clone();
    next.reclean_required = false;
    next.clear_after_image();

    let previous = report.assigned_worker_id;
    let mut effects = Vec::new();

    match replacement {
        Some(worker) => {
            next.assigned_worker_id = Some(worker.id);
            next.assigned_by_admin_id = None;
            next.assigned_by_automation = true;
            next.assigned_at = Some(now);

            if let Some(previous) = previous {
                effects.push(SideEffect::task_reassigned(previous, report.id));
            }
            effects.push(SideEffect::task_assigned(
                worker.id,
                report.id,
                report.priority.map(|p| p.as_str()),
            ));
        }
        None => {
            if let Some(previous) = previous {
                effects.push(SideEffect::cleaning_rejected(
                    previous,
                    report.id,
                    AI_CLEANING_REJECT_REASON,
                ));
            }
        }
    }

    Transition {
        from: report.status,
        report: next,
        effects,
    }
}

/// The lifecycle state machine
pub struct LifecycleController {
    db: SqlitePool,
    scoring: Arc<dyn ScoringService>,
    selector: WorkerSelector,
    duplicates: DuplicateDetector,
    executor: EffectExecutor,
    config: Arc<LifecycleConfig>,
}

impl LifecycleController {
    pub fn new(db: SqlitePool, scoring: Arc<dyn ScoringService>, config: LifecycleConfig) -> Self {
        Self {
            selector: WorkerSelector::new(db.clone()),
            duplicates: DuplicateDetector::new(db.clone()),
            executor: EffectExecutor::new(db.clone()),
            db,
            scoring,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Score a `Pending` report's before-image and route it
    pub async fn evaluate_new_submission(&self, report_id: Uuid) -> Result<EvaluationOutcome> {
        let report = db::reports::require_report(&self.db, report_id).await?;
        if report.status != ReportStatus::Pending {
            return Err(Error::Conflict(format!(
                "report {report_id} is {}, not Pending",
                report.status
            )));
        }

        let mut verdict = match self.score_before(&report).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(report_id = %report_id, error = %e, "Scoring unavailable; report stays Pending");
                return Ok(EvaluationOutcome::Skipped {
                    report,
                    reason: e.to_string(),
                });
            }
        };

        if let Some(fingerprint) = verdict.fingerprint().map(str::to_string) {
            match self.duplicates.is_duplicate_before(&fingerprint, report_id).await {
                Ok(true) => {
                    tracing::info!(report_id = %report_id, hash = %fingerprint, "Duplicate before-image");
                    verdict = verdict.into_duplicate();
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(report_id = %report_id, error = %e, "Duplicate check failed; continuing without it");
                }
            }
        }

        let worker = match verdict {
            BeforeVerdict::Approve { .. } => self.selector.select(Some(report.location), None).await?,
            BeforeVerdict::Reject { .. } => None,
        };

        let transition = plan_new_submission(&report, verdict, worker.as_ref(), Utc::now());
        tracing::info!(
            report_id = %report_id,
            status = %transition.report.status,
            worker_id = ?transition.report.assigned_worker_id,
            flags = ?transition.report.ai_flags,
            "New submission evaluated"
        );

        let (report, dispatch) = self.commit(transition).await?;
        Ok(EvaluationOutcome::Applied { report, dispatch })
    }

    /// Compare a `Cleaned` report's before/after images and settle it
    pub async fn evaluate_cleaning_submission(&self, report_id: Uuid) -> Result<EvaluationOutcome> {
        let report = db::reports::require_report(&self.db, report_id).await?;
        if report.status != ReportStatus::Cleaned || report.after_image_url.is_none() {
            return Err(Error::Conflict(format!(
                "report {report_id} has no cleaning awaiting review (status {})",
                report.status
            )));
        }

        let mut verdict = match self.score_after(&report).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(report_id = %report_id, error = %e, "Scoring unavailable; report stays Cleaned");
                return Ok(EvaluationOutcome::Skipped {
                    report,
                    reason: e.to_string(),
                });
            }
        };

        if let Some(after_hash) = verdict.after_hash.clone() {
            match self.duplicates.is_duplicate_after(&after_hash, report_id).await {
                Ok(true) => {
                    tracing::info!(report_id = %report_id, hash = %after_hash, "Duplicate after-image");
                    verdict.flags.insert(DUPLICATE_AFTER_FLAG.to_string());
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(report_id = %report_id, error = %e, "Duplicate check failed; continuing without it");
                }
            }
        }

        let now = Utc::now();
        let transition = if verdict.is_clean_accept() {
            plan_cleaning_approval(&report, &verdict, &self.config.rewards, now)
        } else if verdict.decision == CleaningDecision::Reclean {
            plan_reclean(&report, &verdict)
        } else {
            let replacement = self
                .selector
                .select(Some(report.location), report.assigned_worker_id)
                .await?;
            plan_cleaning_rejection(&report, &verdict, replacement.as_ref(), now)
        };

        tracing::info!(
            report_id = %report_id,
            decision = ?verdict.decision,
            status = %transition.report.status,
            flags = ?transition.report.ai_flags,
            "Cleaning evaluated"
        );

        let (report, dispatch) = self.commit(transition).await?;
        Ok(EvaluationOutcome::Applied { report, dispatch })
    }

    /// Write a transition under its status guard, read the row back, then
    /// dispatch effects
    ///
    /// A guard miss returns `Conflict` before any effect runs.
    pub async fn commit(&self, transition: Transition) -> Result<(Report, DispatchReport)> {
        let Transition {
            from,
            report,
            effects,
        } = transition;

        db::reports::update_report_if_status(&self.db, &report, from).await?;
        let committed = db::reports::require_report(&self.db, report.id).await?;

        let dispatch = self.executor.apply(report.id, effects).await;
        if !dispatch.is_complete() {
            tracing::warn!(
                report_id = %report.id,
                failed = dispatch.failures.len(),
                applied = dispatch.applied,
                "Some side effects were not applied"
            );
        }

        Ok((committed, dispatch))
    }

    async fn score_before(&self, report: &Report) -> std::result::Result<BeforeVerdict, ScoringError> {
        let (image_path, image_url) =
            resolve_image_ref(&report.before_image_url, &self.config.upload_dir).into_parts();
        let request = BeforeAnalysisRequest {
            report_id: report.id.to_string(),
            image_path,
            image_url,
            lat: Some(report.location.lat),
            lng: Some(report.location.lng),
        };

        let timeout = self.config.scoring_timeout;
        let response = tokio::time::timeout(timeout, self.scoring.analyze_before(&request))
            .await
            .map_err(|_| ScoringError::Timeout(timeout))??;

        Ok(BeforeVerdict::from(response))
    }

    async fn score_after(&self, report: &Report) -> std::result::Result<CleaningVerdict, ScoringError> {
        let upload_dir = &self.config.upload_dir;
        let (before_image_path, before_image_url) =
            resolve_image_ref(&report.before_image_url, upload_dir).into_parts();
        let (after_image_path, after_image_url) =
            resolve_image_ref(report.after_image_url.as_deref().unwrap_or_default(), upload_dir)
                .into_parts();
        let request = AfterAnalysisRequest {
            report_id: report.id.to_string(),
            before_image_path,
            after_image_path,
            before_image_url,
            after_image_url,
        };

        let timeout = self.config.scoring_timeout;
        let response = tokio::time::timeout(timeout, self.scoring.analyze_after(&request))
            .await
            .map_err(|_| ScoringError::Timeout(timeout))??;

        Ok(CleaningVerdict::from(response))
    }
}
