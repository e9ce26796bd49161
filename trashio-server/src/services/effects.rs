//! Side-effect intents and their executor
//!
//! Decisions produce a list of `SideEffect`s. They are applied only after
//! the report write has committed, in order, and a failed effect never
//! undoes the transition; it is logged and reported in `DispatchReport`.

use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::models::{Notification, NotificationKind, Payment, PaymentType, ReportStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Notify {
        recipient: Uuid,
        kind: NotificationKind,
        title: String,
        message: String,
        meta: Value,
    },
    IssuePayment {
        report_id: Uuid,
        recipient: Uuid,
        amount: f64,
        kind: PaymentType,
    },
}

impl SideEffect {
    fn notify(recipient: Uuid, kind: NotificationKind, title: &str, message: String, meta: Value) -> Self {
        SideEffect::Notify {
            recipient,
            kind,
            title: title.to_string(),
            message,
            meta,
        }
    }

    /// Submitter learns the automated review passed
    pub fn report_reviewed(citizen_id: Uuid, report_id: Uuid, status: ReportStatus, worker_found: bool) -> Self {
        let message = if worker_found {
            "AI approved your report and assigned a worker."
        } else {
            "AI approved your report. Waiting for worker assignment."
        };
        Self::notify(
            citizen_id,
            NotificationKind::ReportReviewed,
            "Report reviewed",
            message.to_string(),
            json!({ "report_id": report_id, "status": status.as_str() }),
        )
    }

    /// Submitter learns an administrator approved the report
    pub fn report_approved_by_admin(citizen_id: Uuid, report_id: Uuid, status: ReportStatus) -> Self {
        Self::notify(
            citizen_id,
            NotificationKind::ReportReviewed,
            "Report reviewed",
            "An administrator approved your report.".to_string(),
            json!({ "report_id": report_id, "status": status.as_str() }),
        )
    }

    pub fn report_rejected(citizen_id: Uuid, report_id: Uuid, reason: &str) -> Self {
        Self::notify(
            citizen_id,
            NotificationKind::ReportRejected,
            "Report rejected",
            format!("Your report was rejected: {reason}"),
            json!({ "report_id": report_id, "status": ReportStatus::Rejected.as_str() }),
        )
    }

    pub fn task_assigned(worker_id: Uuid, report_id: Uuid, priority: Option<&str>) -> Self {
        Self::notify(
            worker_id,
            NotificationKind::TaskAssigned,
            "New task assigned",
            "A new cleanup task has been assigned to you.".to_string(),
            json!({ "report_id": report_id, "priority": priority }),
        )
    }

    pub fn task_reassigned(worker_id: Uuid, report_id: Uuid) -> Self {
        Self::notify(
            worker_id,
            NotificationKind::TaskReassigned,
            "Task reassigned",
            "Cleaning was rejected. Task has been reassigned.".to_string(),
            json!({ "report_id": report_id }),
        )
    }

    pub fn reclean_requested(worker_id: Uuid, report_id: Uuid) -> Self {
        Self::notify(
            worker_id,
            NotificationKind::RecleanRequested,
            "Re-clean requested",
            "AI detected partial cleaning. Please re-clean and upload a new photo.".to_string(),
            json!({ "report_id": report_id }),
        )
    }

    pub fn cleaning_rejected(worker_id: Uuid, report_id: Uuid, reason: &str) -> Self {
        Self::notify(
            worker_id,
            NotificationKind::CleaningRejected,
            "Cleaning rejected",
            format!("{reason} Please re-clean and upload a new photo."),
            json!({ "report_id": report_id }),
        )
    }

    pub fn reward_issued(citizen_id: Uuid, report_id: Uuid, amount: f64) -> Self {
        Self::notify(
            citizen_id,
            NotificationKind::RewardIssued,
            "Reward issued",
            "Your report was verified as cleaned. Reward issued.".to_string(),
            json!({ "report_id": report_id, "amount": amount }),
        )
    }

    pub fn payment_issued(worker_id: Uuid, report_id: Uuid, amount: f64) -> Self {
        Self::notify(
            worker_id,
            NotificationKind::PaymentIssued,
            "Payment issued",
            "Cleanup verified. Payment issued.".to_string(),
            json!({ "report_id": report_id, "amount": amount }),
        )
    }

    fn describe(&self) -> String {
        match self {
            SideEffect::Notify { recipient, kind, .. } => {
                format!("notify {} ({})", recipient, kind.as_str())
            }
            SideEffect::IssuePayment { recipient, kind, amount, .. } => {
                format!("pay {} {} ({})", recipient, amount, kind.as_str())
            }
        }
    }
}

/// An effect that could not be applied
#[derive(Debug, Clone, PartialEq)]
pub struct EffectFailure {
    pub effect: SideEffect,
    pub error: String,
}

/// What happened when a transition's effects were applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub applied: usize,
    pub failures: Vec<EffectFailure>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes notification and payment records
#[derive(Clone)]
pub struct EffectExecutor {
    db: SqlitePool,
}

impl EffectExecutor {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Apply every effect in order; keep going past failures
    pub async fn apply(&self, report_id: Uuid, effects: Vec<SideEffect>) -> DispatchReport {
        let mut report = DispatchReport::default();

        for effect in effects {
            let result = match &effect {
                SideEffect::Notify {
                    recipient,
                    kind,
                    title,
                    message,
                    meta,
                } => {
                    let notification = Notification {
                        id: Uuid::new_v4(),
                        user_id: *recipient,
                        kind: *kind,
                        title: title.clone(),
                        message: message.clone(),
                        meta: meta.clone(),
                        read: false,
                        created_at: chrono::Utc::now(),
                    };
                    db::notifications::insert_notification(&self.db, &notification).await
                }
                SideEffect::IssuePayment {
                    report_id,
                    recipient,
                    amount,
                    kind,
                } => {
                    let payment = Payment::issued(*report_id, *recipient, *amount, *kind);
                    db::payments::insert_payment(&self.db, &payment).await
                }
            };

            match result {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    tracing::warn!(
                        report_id = %report_id,
                        effect = %effect.describe(),
                        error = %e,
                        "Side effect failed; transition stands"
                    );
                    report.failures.push(EffectFailure {
                        effect,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reviewed_message_depends_on_assignment() {
        let citizen = Uuid::new_v4();
        let report = Uuid::new_v4();
        let with = SideEffect::report_reviewed(citizen, report, ReportStatus::Assigned, true);
        let without = SideEffect::report_reviewed(citizen, report, ReportStatus::Verified, false);

        match (with, without) {
            (
                SideEffect::Notify { message: a, meta, .. },
                SideEffect::Notify { message: b, .. },
            ) => {
                assert!(a.contains("assigned a worker"));
                assert!(b.contains("Waiting"));
                assert_eq!(meta["status"], "Assigned");
                assert_eq!(meta["report_id"], report.to_string());
            }
            _ => panic!("expected notifications"),
        }
    }

    #[test]
    fn test_payment_notice_carries_amount() {
        let effect = SideEffect::payment_issued(Uuid::new_v4(), Uuid::new_v4(), 50.0);
        let SideEffect::Notify { kind, meta, .. } = effect else {
            panic!("expected notification");
        };
        assert_eq!(kind, NotificationKind::PaymentIssued);
        assert_eq!(meta["amount"], 50.0);
    }
}
