//! Configuration for trashio-server
//!
//! Loaded once from `trashio-server.toml` (every field optional) and
//! shared read-only after start-up.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use trashio_common::config::LoggingConfig;
use trashio_common::{Error, Result};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port (default 5810)
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory served under `/uploads`
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub rewards: RewardsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            database_path: default_database_path(),
            upload_dir: default_upload_dir(),
            cors_origins: default_cors_origins(),
            scoring: ScoringConfig::default(),
            rewards: RewardsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.rewards.validate()
    }

    /// Create the upload directory and pin it to an absolute path
    ///
    /// Stored image references are handed to trashio-ai as file paths, and
    /// that process may run from a different working directory.
    pub fn prepare_upload_dir(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.upload_dir).map_err(|e| {
            Error::Config(format!(
                "Create upload dir {} failed: {}",
                self.upload_dir.display(),
                e
            ))
        })?;
        self.upload_dir = self.upload_dir.canonicalize()?;
        Ok(())
    }
}

/// Where the scoring service lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5811".to_string(),
            timeout_secs: 20,
        }
    }
}

impl ScoringConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "scoring.url must be an http(s) URL (got '{}')",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("scoring.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Amounts paid out when a cleaning is approved
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub submitter_reward_amount: f64,
    pub worker_payment_amount: f64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            submitter_reward_amount: 10.0,
            worker_payment_amount: 50.0,
        }
    }
}

impl RewardsConfig {
    fn validate(&self) -> Result<()> {
        for (name, amount) in [
            ("submitter_reward_amount", self.submitter_reward_amount),
            ("worker_payment_amount", self.worker_payment_amount),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::Config(format!(
                    "rewards.{name} must be a non-negative number (got {amount})"
                )));
            }
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5810
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./trashio.db")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}
