//! Typed scoring verdicts
//!
//! The wire responses carry loosely coupled fields (a reject may or may not
//! have a reason, flags are a list). The controller works on these closed
//! types instead.

use std::collections::BTreeSet;
use trashio_common::scoring::{
    AfterAnalysisResponse, BeforeAnalysisResponse, BeforeDecision, CleaningDecision, Priority,
};

pub const DUPLICATE_BEFORE_FLAG: &str = "duplicate_before_image";
pub const DUPLICATE_AFTER_FLAG: &str = "duplicate_after_image";
pub const HASH_MATCH_FLAG: &str = "before_after_hash_match";
pub const DUPLICATE_REASON: &str = "Duplicate image detected";

/// Outcome of scoring a before-image
#[derive(Debug, Clone, PartialEq)]
pub enum BeforeVerdict {
    Approve {
        severity: f64,
        priority: Priority,
        confidence: f64,
        flags: BTreeSet<String>,
        fingerprint: Option<String>,
    },
    Reject {
        reason: Option<String>,
        severity: f64,
        priority: Priority,
        confidence: f64,
        flags: BTreeSet<String>,
        fingerprint: Option<String>,
    },
}

impl BeforeVerdict {
    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            BeforeVerdict::Approve { fingerprint, .. } | BeforeVerdict::Reject { fingerprint, .. } => {
                fingerprint.as_deref()
            }
        }
    }

    /// Force a rejection because the image was already submitted
    ///
    /// An existing reason is kept; otherwise the duplicate reason is used.
    pub fn into_duplicate(self) -> BeforeVerdict {
        match self {
            BeforeVerdict::Approve {
                severity,
                priority,
                confidence,
                mut flags,
                fingerprint,
            } => {
                flags.insert(DUPLICATE_BEFORE_FLAG.to_string());
                BeforeVerdict::Reject {
                    reason: Some(DUPLICATE_REASON.to_string()),
                    severity,
                    priority,
                    confidence,
                    flags,
                    fingerprint,
                }
            }
            BeforeVerdict::Reject {
                reason,
                severity,
                priority,
                confidence,
                mut flags,
                fingerprint,
            } => {
                flags.insert(DUPLICATE_BEFORE_FLAG.to_string());
                BeforeVerdict::Reject {
                    reason: reason.or_else(|| Some(DUPLICATE_REASON.to_string())),
                    severity,
                    priority,
                    confidence,
                    flags,
                    fingerprint,
                }
            }
        }
    }
}

impl From<BeforeAnalysisResponse> for BeforeVerdict {
    fn from(response: BeforeAnalysisResponse) -> Self {
        let flags: BTreeSet<String> = response.flags.into_iter().collect();
        let fingerprint = response.image_hash.filter(|h| !h.is_empty());
        let forced_duplicate = flags.contains(DUPLICATE_BEFORE_FLAG);

        let verdict = match response.decision {
            BeforeDecision::Approve => BeforeVerdict::Approve {
                severity: response.severity,
                priority: response.priority,
                confidence: response.confidence,
                flags,
                fingerprint,
            },
            BeforeDecision::Reject => BeforeVerdict::Reject {
                reason: response.reason.filter(|r| !r.trim().is_empty()),
                severity: response.severity,
                priority: response.priority,
                confidence: response.confidence,
                flags,
                fingerprint,
            },
        };

        // a duplicate flag from the scorer itself also vetoes approval
        if forced_duplicate {
            verdict.into_duplicate()
        } else {
            verdict
        }
    }
}

/// Outcome of comparing before/after images
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningVerdict {
    pub decision: CleaningDecision,
    pub diff_score: f64,
    pub after_score: f64,
    pub confidence: f64,
    pub before_hash: Option<String>,
    pub after_hash: Option<String>,
    pub flags: BTreeSet<String>,
}

impl CleaningVerdict {
    /// Identical fingerprints mean nothing visibly changed
    pub fn hashes_match(&self) -> bool {
        matches!(
            (&self.before_hash, &self.after_hash),
            (Some(before), Some(after)) if before == after
        )
    }

    /// Approval needs an accepting decision and no fraud signal at all
    pub fn is_clean_accept(&self) -> bool {
        self.decision == CleaningDecision::Accept && self.flags.is_empty()
    }
}

impl From<AfterAnalysisResponse> for CleaningVerdict {
    fn from(response: AfterAnalysisResponse) -> Self {
        let mut verdict = CleaningVerdict {
            decision: response.decision,
            diff_score: response.diff_score,
            after_score: response.after_trash_score,
            confidence: response.confidence,
            before_hash: response.before_image_hash.filter(|h| !h.is_empty()),
            after_hash: response.after_image_hash.filter(|h| !h.is_empty()),
            flags: response.flags.into_iter().collect(),
        };
        if verdict.hashes_match() {
            verdict.flags.insert(HASH_MATCH_FLAG.to_string());
        }
        verdict
    }
}
