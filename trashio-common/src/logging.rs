//! Tracing subscriber set-up
//!
//! The subscriber is installed before the config file is read so that config
//! loading itself can log. It starts at the default level (or `RUST_LOG`) and
//! is narrowed to the configured level once the config is known.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Handle for swapping the active filter after start-up
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Reloadable filter layer: `RUST_LOG` if set, otherwise the default level
pub fn filter_layer(crate_target: &str) -> (reload::Layer<EnvFilter, Registry>, FilterHandle) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(LoggingConfig::default().filter_directive(crate_target))
    });
    reload::Layer::new(filter)
}

/// Install the global subscriber for a service binary
pub fn init_tracing(crate_target: &str) -> FilterHandle {
    let (filter, handle) = filter_layer(crate_target);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    handle
}

/// Narrow the filter to the configured level; `RUST_LOG` always wins
pub fn apply_logging_config(
    handle: &FilterHandle,
    logging: &LoggingConfig,
    crate_target: &str,
) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_new(logging.filter_directive(crate_target))
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", logging.level, e)))?;

    handle
        .reload(filter)
        .map_err(|e| Error::Internal(format!("Log filter reload failed: {e}")))
}
