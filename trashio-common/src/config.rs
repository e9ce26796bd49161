//! Bootstrap configuration loading
//!
//! Every Trashio service reads a small TOML file at start-up. Settings are
//! resolved in this priority order:
//! 1. Command-line argument (bound to an environment variable by clap)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! A missing config file is never fatal: the service logs a warning and
//! starts with defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV_VAR: &str = "TRASHIO_CONFIG";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set,
    /// e.g. `trashio_server=info,trashio_common=info,tower_http=info`
    pub fn filter_directive(&self, crate_target: &str) -> String {
        format!(
            "{crate_target}={level},trashio_common={level},tower_http={level}",
            level = self.level
        )
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform config file location: `<config dir>/trashio/<service>.toml`
pub fn default_config_path(service: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trashio").join(format!("{service}.toml")))
}

/// Pick the config file: explicit path (CLI or `TRASHIO_CONFIG`) wins over
/// the platform default.
pub fn resolve_config_path(explicit: Option<&Path>, service: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path(service)
}

/// Load a TOML config file, falling back to defaults when the file is absent
///
/// Parse errors in an existing file are reported as `Error::Config`; a
/// half-written config should not silently start a service with defaults.
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        warn!("No config file location available, using built-in defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}
