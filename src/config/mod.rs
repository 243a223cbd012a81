//! Configuration management
//!
//! Handles ndisc.toml: logging settings and the default checksum addresses.

mod types;
mod validation;

pub use types::*;
pub use validation::{ValidationResult, validate};

use crate::{Error, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Parse configuration from TOML text
pub fn parse(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// Render the effective configuration, defaults included
pub fn to_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))
}
