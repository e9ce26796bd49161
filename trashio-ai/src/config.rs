//! Configuration for trashio-ai
//!
//! Bootstrap settings come from `trashio-ai.toml`; every field has a
//! built-in default. Analyzer thresholds are fixed heuristics, not learned
//! values, and are exposed here so deployments can tune them without a
//! rebuild.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trashio_common::config::LoggingConfig;
use trashio_common::{Error, Result};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct AiServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port (default 5811)
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Timeout for fetching http(s) image sources
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Largest image accepted from a path or URL (default 20 MiB)
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,

    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

impl Default for AiServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_image_bytes: default_max_image_bytes(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl AiServiceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Heuristic thresholds for the image analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Fingerprint grid edge (N in N×N)
    pub hash_size: u32,
    /// Weight of the mean edge response in the trash score
    pub edge_weight: f64,
    /// Weight of the grayscale standard deviation in the trash score
    pub contrast_weight: f64,
    /// Score at or above which trash is considered present
    pub trash_threshold: f64,
    /// Severity at or above which priority is High
    pub high_severity: f64,
    /// Severity at or above which priority is Medium
    pub medium_severity: f64,
    /// Square canvas both images are resized to before diffing
    pub diff_canvas: u32,
    /// Diff below this raises `low_change_detected`
    pub low_change_threshold: f64,
    /// After-score must be below this to accept
    pub accept_max_after_score: f64,
    /// Diff must be at least this to accept
    pub accept_min_diff: f64,
    /// After-score below this (but not accepted) asks for a re-clean
    pub reclean_max_after_score: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            hash_size: 8,
            edge_weight: 0.7,
            contrast_weight: 0.3,
            trash_threshold: 0.35,
            high_severity: 0.7,
            medium_severity: 0.45,
            diff_canvas: 256,
            low_change_threshold: 0.08,
            accept_max_after_score: 0.25,
            accept_min_diff: 0.12,
            reclean_max_after_score: 0.45,
        }
    }
}

impl AnalyzerConfig {
    /// Reject configurations the analyzer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.hash_size < 2 {
            return Err(Error::Config(format!(
                "analyzer.hash_size must be at least 2 (got {})",
                self.hash_size
            )));
        }
        if self.diff_canvas == 0 {
            return Err(Error::Config("analyzer.diff_canvas must be positive".to_string()));
        }
        if self.medium_severity > self.high_severity {
            return Err(Error::Config(format!(
                "analyzer.medium_severity ({}) exceeds analyzer.high_severity ({})",
                self.medium_severity, self.high_severity
            )));
        }
        if self.accept_max_after_score > self.reclean_max_after_score {
            return Err(Error::Config(format!(
                "analyzer.accept_max_after_score ({}) exceeds analyzer.reclean_max_after_score ({})",
                self.accept_max_after_score, self.reclean_max_after_score
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5811
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_max_image_bytes() -> u64 {
    20 * 1024 * 1024
}
