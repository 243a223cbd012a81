//! Configuration validation

use super::Config;
use crate::telemetry::{LOG_FORMATS, LOG_LEVELS};

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn print_diagnostics(&self) {
        for warning in &self.warnings {
            println!("[WARN] {}", warning);
        }
        for error in &self.errors {
            println!("[ERROR] {}", error);
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration and return warnings/errors
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_log(config, &mut result);
    validate_checksum(config, &mut result);

    result
}

fn validate_log(config: &Config, result: &mut ValidationResult) {
    let level = config.log.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        result.warn(format!(
            "log.level: unknown level '{}', using info",
            config.log.level
        ));
    }

    if !LOG_FORMATS.contains(&config.log.format.as_str()) {
        result.warn(format!(
            "log.format: unknown format '{}', using pretty",
            config.log.format
        ));
    }
}

fn validate_checksum(config: &Config, result: &mut ValidationResult) {
    let Some(checksum) = &config.checksum else {
        return;
    };

    // A multicast source never appears on the wire
    if checksum.source.is_multicast() {
        result.warn(format!(
            "checksum.source: {} is a multicast address",
            checksum.source
        ));
    }

    if checksum.destination.is_unspecified() {
        result.error("checksum.destination: unspecified address (::) is not a valid destination");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChecksumConfig;
    use crate::telemetry::LogConfig;
    use std::net::Ipv6Addr;

    fn make_config() -> Config {
        Config {
            log: LogConfig::default(),
            checksum: Some(ChecksumConfig::new(
                "fe80::1".parse().unwrap(),
                "ff02::1".parse().unwrap(),
            )),
        }
    }

    #[test]
    fn test_valid_config() {
        let result = validate(&make_config());
        assert!(!result.has_errors());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_default_config_is_valid() {
        let result = validate(&Config::default());
        assert!(!result.has_errors());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let mut config = make_config();
        config.log.level = "DEBUG".to_string();
        assert!(validate(&config).warnings.is_empty());
    }

    #[test]
    fn test_unknown_log_level_and_format() {
        let mut config = make_config();
        config.log = LogConfig::new("verbose", "xml");

        let result = validate(&config);
        assert!(!result.has_errors());
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("log.level"));
        assert!(result.warnings[1].contains("log.format"));
    }

    #[test]
    fn test_multicast_source_warning() {
        let mut config = make_config();
        config.checksum = Some(ChecksumConfig::new(
            "ff02::2".parse().unwrap(),
            "ff02::1".parse().unwrap(),
        ));

        let result = validate(&config);
        assert!(!result.has_errors());
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.contains("checksum.source"))
        );
    }

    #[test]
    fn test_unspecified_destination() {
        let mut config = make_config();
        config.checksum = Some(ChecksumConfig::new(
            "fe80::1".parse().unwrap(),
            Ipv6Addr::UNSPECIFIED,
        ));

        let result = validate(&config);
        assert!(result.has_errors());
        assert!(result.errors[0].contains("checksum.destination"));
    }
}
