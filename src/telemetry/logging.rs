//! Logging configuration and initialization.
//!
//! The library only emits `tracing` events; this module installs the
//! subscriber for the `ndisc` tool. Sources, highest priority first:
//! - RUST_LOG environment variable
//! - `[log]` table of the config file
//! - info level, pretty format

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Levels accepted in the `level` key
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Formats accepted in the `format` key
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

/// `[log]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,
    /// Output format: pretty, compact, json
    pub format: String,
}

impl LogConfig {
    pub fn new(level: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: format.into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info", "pretty")
    }
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(config: Option<&LogConfig>) {
    let env_filter = build_filter(config);
    let format = config.map(|c| c.format.as_str()).unwrap_or("pretty");

    // Diagnostics go to stderr so decoded output on stdout stays clean
    let result = match format {
        "json" => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        ),
        "compact" => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            ),
        ),
        _ => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

fn build_filter(config: Option<&LogConfig>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    let level = config.map(|c| parse_level(&c.level)).unwrap_or(Level::INFO);
    EnvFilter::new(level.as_str())
}

/// Parses a log level string, falling back to INFO.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}
