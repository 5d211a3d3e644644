//! # Configuration Validation
//!
//! Provides validation for all configuration structures using the `validator` crate.

use crate::config::Config;
use validator::Validate;

/// Validate configuration structure.
///
/// ## Validation Rules
/// ### Server
/// - `host`: 1-255 characters
/// - `port`: 1-65535
///
/// ### Language Model
/// - `model`: 1-255 characters
/// - `base_url`: must start with http:// or https://
/// - `timeout_secs`: 1-600
///
/// ### Retry
/// - `max_attempts`: 1-10
/// - `delay_ms`: 0-60000
///
/// ### Pipeline
/// - `request_deadline_secs`: 1-900
/// - `history_window`: 0-100
///
/// ### Observability
/// - `logging_level`: must be "trace", "debug", "info", "warn", or "error"
pub fn validate(config: &Config) -> Result<(), validator::ValidationErrors> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_delay_too_long() {
        let mut config = Config::default();
        config.retry.delay_ms = 120_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_zero_deadline() {
        let mut config = Config::default();
        config.pipeline.request_deadline_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_base_url() {
        let mut config = Config::default();
        config.llm.base_url = "api.groq.com".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_logging_level() {
        let mut config = Config::default();
        config.observability.logging_level = "verbose".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_empty_system_prompt() {
        let mut config = Config::default();
        config.llm.system_prompt = String::new();
        assert!(validate(&config).is_err());
    }
}
