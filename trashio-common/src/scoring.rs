//! Scoring wire contract
//!
//! JSON records exchanged between the report service and the image
//! analyzer service (`POST /analyze/before`, `POST /analyze/after`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version tag reported by the heuristic analyzer
pub const MODEL_VERSION: &str = "heuristic-v1";

/// Cleanup priority derived from severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Priority::Low),
            "Medium" => Ok(Priority::Medium),
            "High" => Ok(Priority::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// Decision on a before-image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeforeDecision {
    Approve,
    Reject,
}

/// Decision on a before/after pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleaningDecision {
    Accept,
    Reclean,
    Reject,
}

/// POST /analyze/before request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeforeAnalysisRequest {
    pub report_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// POST /analyze/before response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeforeAnalysisResponse {
    pub decision: BeforeDecision,
    pub trash_present: bool,
    /// Trash-likelihood score, 0.0 - 1.0
    pub severity: f64,
    pub priority: Priority,
    pub confidence: f64,
    #[serde(default)]
    pub reason: Option<String>,
    /// Average-hash fingerprint of the image
    #[serde(default)]
    pub image_hash: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

/// POST /analyze/after request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AfterAnalysisRequest {
    pub report_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_image_url: Option<String>,
}

/// POST /analyze/after response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfterAnalysisResponse {
    pub decision: CleaningDecision,
    pub cleaned: bool,
    pub confidence: f64,
    #[serde(default)]
    pub before_image_hash: Option<String>,
    #[serde(default)]
    pub after_image_hash: Option<String>,
    /// Mean per-pixel difference, 0.0 - 1.0
    pub diff_score: f64,
    /// Trash-likelihood score of the after-image, 0.0 - 1.0
    pub after_trash_score: f64,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

fn default_model_version() -> String {
    MODEL_VERSION.to_string()
}
