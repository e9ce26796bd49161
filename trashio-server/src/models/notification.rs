//! In-app notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Notification type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ReportReviewed,
    ReportRejected,
    TaskAssigned,
    TaskReassigned,
    RecleanRequested,
    CleaningRejected,
    RewardIssued,
    PaymentIssued,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ReportReviewed => "report_reviewed",
            NotificationKind::ReportRejected => "report_rejected",
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::TaskReassigned => "task_reassigned",
            NotificationKind::RecleanRequested => "reclean_requested",
            NotificationKind::CleaningRejected => "cleaning_rejected",
            NotificationKind::RewardIssued => "reward_issued",
            NotificationKind::PaymentIssued => "payment_issued",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report_reviewed" => Ok(NotificationKind::ReportReviewed),
            "report_rejected" => Ok(NotificationKind::ReportRejected),
            "task_assigned" => Ok(NotificationKind::TaskAssigned),
            "task_reassigned" => Ok(NotificationKind::TaskReassigned),
            "reclean_requested" => Ok(NotificationKind::RecleanRequested),
            "cleaning_rejected" => Ok(NotificationKind::CleaningRejected),
            "reward_issued" => Ok(NotificationKind::RewardIssued),
            "payment_issued" => Ok(NotificationKind::PaymentIssued),
            other => Err(format!("unknown notification kind '{other}'")),
        }
    }
}

/// Append-only notification record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub meta: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
