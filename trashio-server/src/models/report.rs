//! Cleanup report and its lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use trashio_common::scoring::Priority;
use uuid::Uuid;

/// Report status
///
/// Automated path: `Pending → Verified → Assigned → Cleaned → Approved`,
/// with `Pending → Rejected` and `Cleaned → Assigned` (re-clean or
/// reassignment) as the side branches. `Completed` is reachable only by
/// administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    Verified,
    Assigned,
    Cleaned,
    Approved,
    Completed,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Verified => "Verified",
            ReportStatus::Assigned => "Assigned",
            ReportStatus::Cleaned => "Cleaned",
            ReportStatus::Approved => "Approved",
            ReportStatus::Completed => "Completed",
            ReportStatus::Rejected => "Rejected",
        }
    }

    /// Whether `next` is a single edge of the lifecycle graph
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, next),
            (Pending, Verified)
                | (Pending, Rejected)
                | (Verified, Assigned)
                | (Assigned, Cleaned)
                | (Cleaned, Approved)
                | (Cleaned, Assigned)
                | (Approved, Completed)
                | (Rejected, Completed)
        )
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ReportStatus::Pending),
            "Verified" => Ok(ReportStatus::Verified),
            "Assigned" => Ok(ReportStatus::Assigned),
            "Cleaned" => Ok(ReportStatus::Cleaned),
            "Approved" => Ok(ReportStatus::Approved),
            "Completed" => Ok(ReportStatus::Completed),
            "Rejected" => Ok(ReportStatus::Rejected),
            other => Err(format!("unknown report status '{other}'")),
        }
    }
}

/// Last automated decision recorded on a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiDecision {
    Approve,
    Reject,
    Accept,
    Reclean,
}

impl AiDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiDecision::Approve => "approve",
            AiDecision::Reject => "reject",
            AiDecision::Accept => "accept",
            AiDecision::Reclean => "reclean",
        }
    }
}

impl FromStr for AiDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(AiDecision::Approve),
            "reject" => Ok(AiDecision::Reject),
            "accept" => Ok(AiDecision::Accept),
            "reclean" => Ok(AiDecision::Reclean),
            other => Err(format!("unknown decision '{other}'")),
        }
    }
}

/// WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Cleanup report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    /// Submitter; never changes after creation
    pub citizen_id: Uuid,
    pub description: String,
    pub location: GeoPoint,
    pub before_image_url: String,
    pub before_image_thumb_url: Option<String>,
    pub after_image_url: Option<String>,
    pub after_image_thumb_url: Option<String>,

    pub status: ReportStatus,
    pub priority: Option<Priority>,
    pub severity: Option<f64>,

    pub ai_decision: Option<AiDecision>,
    pub ai_reason: Option<String>,
    pub ai_flags: BTreeSet<String>,
    /// Set once an automated decision is recorded for the current stage;
    /// cleared by administrator actions
    pub ai_locked: bool,
    pub before_image_hash: Option<String>,
    pub after_image_hash: Option<String>,

    pub verified_by_admin_id: Option<Uuid>,
    pub verified_by_automation: bool,
    pub verified_at: Option<DateTime<Utc>>,

    pub assigned_worker_id: Option<Uuid>,
    pub assigned_by_admin_id: Option<Uuid>,
    pub assigned_by_automation: bool,
    pub assigned_at: Option<DateTime<Utc>>,

    pub cleaned_at: Option<DateTime<Utc>>,
    pub cleaning_verified_by_admin_id: Option<Uuid>,
    pub cleaning_verified_by_automation: bool,
    pub cleaning_verified_at: Option<DateTime<Utc>>,

    /// Non-null exactly when status is `Rejected`
    pub rejected_reason: Option<String>,
    pub reclean_required: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Fresh `Pending` report with no automation fields set
    pub fn new(
        citizen_id: Uuid,
        description: String,
        location: GeoPoint,
        before_image_url: String,
        before_image_thumb_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            citizen_id,
            description,
            location,
            before_image_url,
            before_image_thumb_url,
            after_image_url: None,
            after_image_thumb_url: None,
            status: ReportStatus::Pending,
            priority: None,
            severity: None,
            ai_decision: None,
            ai_reason: None,
            ai_flags: BTreeSet::new(),
            ai_locked: false,
            before_image_hash: None,
            after_image_hash: None,
            verified_by_admin_id: None,
            verified_by_automation: false,
            verified_at: None,
            assigned_worker_id: None,
            assigned_by_admin_id: None,
            assigned_by_automation: false,
            assigned_at: None,
            cleaned_at: None,
            cleaning_verified_by_admin_id: None,
            cleaning_verified_by_automation: false,
            cleaning_verified_at: None,
            rejected_reason: None,
            reclean_required: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Drop the proof-of-cleaning upload so the worker must resubmit
    pub fn clear_after_image(&mut self) {
        self.after_image_url = None;
        self.after_image_thumb_url = None;
        self.cleaned_at = None;
    }

    /// Move to `status`, keeping `rejected_reason` consistent with it
    ///
    /// `reason` is used when entering `Rejected` without a stored reason.
    pub fn set_status(&mut self, status: ReportStatus, reason: &str) {
        self.status = status;
        if status == ReportStatus::Rejected {
            if self.rejected_reason.is_none() {
                self.rejected_reason = Some(reason.to_string());
            }
        } else {
            self.rejected_reason = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report::new(
            Uuid::new_v4(),
            "Bags of rubbish by the bus stop".to_string(),
            GeoPoint::new(51.5, -0.12),
            "/uploads/before.jpg".to_string(),
            None,
        )
    }

    #[test]
    fn test_new_report_is_pending_and_unscored() {
        let report = report();
        assert_eq!(report.status, ReportStatus::Pending);
        assert!(report.priority.is_none());
        assert!(report.ai_decision.is_none());
        assert!(!report.ai_locked);
        assert!(report.rejected_reason.is_none());
    }

    #[test]
    fn test_lifecycle_edges() {
        use ReportStatus::*;
        assert!(Pending.can_transition_to(Verified));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Cleaned.can_transition_to(Assigned));
        assert!(!Pending.can_transition_to(Cleaned));
        assert!(!Approved.can_transition_to(Assigned));
        assert!(!Rejected.can_transition_to(Verified));
    }

    #[test]
    fn test_set_status_keeps_rejected_reason_invariant() {
        let mut report = report();
        report.set_status(ReportStatus::Rejected, "Updated by admin");
        assert_eq!(report.rejected_reason.as_deref(), Some("Updated by admin"));

        report.set_status(ReportStatus::Verified, "unused");
        assert!(report.rejected_reason.is_none());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::Verified,
            ReportStatus::Assigned,
            ReportStatus::Cleaned,
            ReportStatus::Approved,
            ReportStatus::Completed,
            ReportStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ReportStatus>(), Ok(status));
        }
        assert!("Done".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn test_geo_bounds() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
    }
}
