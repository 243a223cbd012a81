//! Telemetry module for logging.
//!
//! Provides logging configuration and subscriber initialization for the
//! `ndisc` tool.

mod logging;

pub use logging::{LOG_FORMATS, LOG_LEVELS, LogConfig, init_logging};
