//! Tests for start-up logging: config loading must be visible in the log
//!
//! Tests touch RUST_LOG and are marked #[serial].

use serial_test::serial;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;
use trashio_common::config::{load_toml_config, LoggingConfig};
use trashio_common::logging::{apply_logging_config, filter_layer, FilterHandle};
use trashio_common::Error;

/// Captured formatted log output
#[derive(Clone, Default)]
struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }

    fn contains(&self, pattern: &str) -> bool {
        self.text().contains(pattern)
    }
}

impl Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` under the same subscriber layout the services install at start-up
fn with_service_subscriber<F: FnOnce(&FilterHandle)>(capture: &LogCapture, f: F) {
    let (filter, handle) = filter_layer("trashio_ai");
    let writer = capture.clone();
    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(move || writer.clone()),
    );
    tracing::subscriber::with_default(subscriber, || f(&handle));
}

#[derive(Debug, Default, serde::Deserialize)]
struct EmptyConfig {}

#[test]
#[serial]
fn test_missing_config_warning_reaches_log_before_config_is_applied() {
    std::env::remove_var("RUST_LOG");
    let capture = LogCapture::default();

    with_service_subscriber(&capture, |_| {
        let _: EmptyConfig =
            load_toml_config(Some(Path::new("/nonexistent/trashio-ai.toml"))).unwrap();
    });

    assert!(
        capture.contains("Config file not found, using built-in defaults"),
        "log output was: {}",
        capture.text()
    );
    assert!(capture.contains("/nonexistent/trashio-ai.toml"));
}

#[test]
#[serial]
fn test_configured_level_narrows_filter() {
    std::env::remove_var("RUST_LOG");
    let capture = LogCapture::default();

    with_service_subscriber(&capture, |handle| {
        let logging = LoggingConfig {
            level: "error".to_string(),
        };
        apply_logging_config(handle, &logging, "trashio_ai").unwrap();

        let _: EmptyConfig = load_toml_config(Some(Path::new("/nonexistent/quiet.toml"))).unwrap();
    });

    assert!(!capture.contains("Config file not found"));
}

#[test]
#[serial]
fn test_rust_log_overrides_configured_level() {
    std::env::set_var("RUST_LOG", "trashio_common=warn");
    let capture = LogCapture::default();

    with_service_subscriber(&capture, |handle| {
        let logging = LoggingConfig {
            level: "error".to_string(),
        };
        apply_logging_config(handle, &logging, "trashio_ai").unwrap();

        let _: EmptyConfig = load_toml_config(Some(Path::new("/nonexistent/loud.toml"))).unwrap();
    });
    std::env::remove_var("RUST_LOG");

    assert!(capture.contains("Config file not found"));
}

#[test]
#[serial]
fn test_invalid_level_is_config_error() {
    std::env::remove_var("RUST_LOG");
    let capture = LogCapture::default();

    with_service_subscriber(&capture, |handle| {
        let logging = LoggingConfig {
            level: "loudest".to_string(),
        };
        let result = apply_logging_config(handle, &logging, "trashio_ai");
        assert!(matches!(result, Err(Error::Config(_))));
    });
}
