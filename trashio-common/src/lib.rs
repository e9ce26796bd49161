//! # Trashio Common Library
//!
//! Shared code for the Trashio services:
//! - Error type used by persistence and domain code
//! - Bootstrap configuration loading (TOML + defaults)
//! - Tracing subscriber set-up shared by the service binaries
//! - Scoring wire contract shared by the analyzer service and its client

pub mod config;
pub mod error;
pub mod logging;
pub mod scoring;

pub use error::{Error, Result};
