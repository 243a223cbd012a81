//! Configuration types

use crate::telemetry::LogConfig;
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;

/// User-defined configuration (ndisc.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub checksum: Option<ChecksumConfig>,
}

/// Default pseudo-header addresses for checksum verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChecksumConfig {
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
}

impl ChecksumConfig {
    pub fn new(source: Ipv6Addr, destination: Ipv6Addr) -> Self {
        Self {
            source,
            destination,
        }
    }
}
