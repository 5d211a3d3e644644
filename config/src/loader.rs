//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! - `QB_*`: QuickBrief settings
//! - `GROQ_*`: Language model provider settings
//! - `SENDGRID_*`: Mail transport settings

use crate::config::{
    Config, LlmConfig, MailConfig, ObservabilityConfig, PipelineConfig, RetryConfig, ServerConfig
};
use std::env;

/// Load configuration from environment variables.
///
/// Unset or unparseable variables fall back to the defaults of
/// [`Config::default`].
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_env()?;
///     println!("Model: {}", config.llm.model);
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// ### Server
/// - `QB_HOST`: Bind host (default: "0.0.0.0")
/// - `QB_PORT`: Bind port (default: 3000)
///
/// ### Language Model
/// - `GROQ_API_KEY`: Provider API key (required for model calls)
/// - `GROQ_MODEL`: Model id (default: "deepseek-r1-distill-qwen-32b")
/// - `GROQ_BASE_URL`: OpenAI-compatible base URL (default: Groq)
/// - `QB_LLM_TIMEOUT_SECS`: Per-call HTTP timeout (default: 60)
/// - `QB_SYSTEM_PROMPT`: System instructions for every call
///
/// ### Retry and Pipeline
/// - `QB_RETRY_MAX_ATTEMPTS`: Attempts per model call (default: 3)
/// - `QB_RETRY_DELAY_MS`: Fixed delay between attempts (default: 1500)
/// - `QB_REQUEST_DEADLINE_SECS`: Deadline per routed request (default: 120)
/// - `QB_HISTORY_WINDOW`: Turns rendered into prompts (default: 10)
///
/// ### Mail
/// - `SENDGRID_API_KEY`: SendGrid API key (required for sending)
/// - `SENDGRID_BASE_URL`: SendGrid API base (default: "https://api.sendgrid.com")
/// - `QB_MAIL_FROM`: Default sender address
/// - `QB_MAIL_TO`: Default recipient for drafts
///
/// ### Observability
/// - `QB_METRICS_ENABLED`: Enable metrics (true/false, default: true)
/// - `QB_LOG_LEVEL`: Logging level (trace/debug/info/warn/error, default: "info")
pub fn load_from_env() -> Result<Config, Box<dyn std::error::Error>> {
    let config = Config {
        server: load_server_from_env()?,
        llm: load_llm_from_env()?,
        retry: load_retry_from_env()?,
        pipeline: load_pipeline_from_env()?,
        mail: load_mail_from_env()?,
        observability: load_observability_from_env()?
    };

    Ok(config)
}

fn load_server_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let defaults = ServerConfig::default();
    Ok(ServerConfig {
        host: env::var("QB_HOST").unwrap_or(defaults.host),
        port: parse_env("QB_PORT").unwrap_or(defaults.port)
    })
}

fn load_llm_from_env() -> Result<LlmConfig, Box<dyn std::error::Error>> {
    let defaults = LlmConfig::default();
    Ok(LlmConfig {
        api_key: non_empty_env("GROQ_API_KEY"),
        model: non_empty_env("GROQ_MODEL").unwrap_or(defaults.model),
        base_url: non_empty_env("GROQ_BASE_URL").unwrap_or(defaults.base_url),
        timeout_secs: parse_env("QB_LLM_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
        system_prompt: non_empty_env("QB_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt)
    })
}

fn load_retry_from_env() -> Result<RetryConfig, Box<dyn std::error::Error>> {
    let defaults = RetryConfig::default();
    Ok(RetryConfig {
        max_attempts: parse_env("QB_RETRY_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
        delay_ms: parse_env("QB_RETRY_DELAY_MS").unwrap_or(defaults.delay_ms)
    })
}

fn load_pipeline_from_env() -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let defaults = PipelineConfig::default();
    Ok(PipelineConfig {
        request_deadline_secs: parse_env("QB_REQUEST_DEADLINE_SECS")
            .unwrap_or(defaults.request_deadline_secs),
        history_window: parse_env("QB_HISTORY_WINDOW").unwrap_or(defaults.history_window)
    })
}

fn load_mail_from_env() -> Result<MailConfig, Box<dyn std::error::Error>> {
    let defaults = MailConfig::default();
    Ok(MailConfig {
        sendgrid_api_key: non_empty_env("SENDGRID_API_KEY"),
        base_url: non_empty_env("SENDGRID_BASE_URL").unwrap_or(defaults.base_url),
        default_from: non_empty_env("QB_MAIL_FROM"),
        default_to: non_empty_env("QB_MAIL_TO")
    })
}

fn load_observability_from_env() -> Result<ObservabilityConfig, Box<dyn std::error::Error>> {
    let defaults = ObservabilityConfig::default();
    Ok(ObservabilityConfig {
        metrics_enabled: parse_env("QB_METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
        logging_level: env::var("QB_LOG_LEVEL").unwrap_or(defaults.logging_level)
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static
{
    match env::var(key) {
        Ok(s) => s
            .trim()
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_KEYS: [&str; 17] = [
        "QB_HOST",
        "QB_PORT",
        "GROQ_API_KEY",
        "GROQ_MODEL",
        "GROQ_BASE_URL",
        "QB_LLM_TIMEOUT_SECS",
        "QB_SYSTEM_PROMPT",
        "QB_RETRY_MAX_ATTEMPTS",
        "QB_RETRY_DELAY_MS",
        "QB_REQUEST_DEADLINE_SECS",
        "QB_HISTORY_WINDOW",
        "SENDGRID_API_KEY",
        "SENDGRID_BASE_URL",
        "QB_MAIL_FROM",
        "QB_MAIL_TO",
        "QB_METRICS_ENABLED",
        "QB_LOG_LEVEL",
    ];

    fn clear_env() {
        for key in ALL_KEYS {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        clear_env();

        let config = load_from_env().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_load_from_env_custom_values() {
        clear_env();
        unsafe {
            env::set_var("QB_PORT", "8088");
            env::set_var("GROQ_API_KEY", "gsk_test");
            env::set_var("GROQ_MODEL", "llama-3.3-70b-versatile");
            env::set_var("QB_RETRY_MAX_ATTEMPTS", "5");
            env::set_var("QB_RETRY_DELAY_MS", "250");
            env::set_var("SENDGRID_API_KEY", "SG.test");
            env::set_var("QB_MAIL_FROM", "briefs@example.com");
            env::set_var("QB_LOG_LEVEL", "debug");
        }

        let config = load_from_env().unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay_ms, 250);
        assert_eq!(config.mail.sendgrid_api_key.as_deref(), Some("SG.test"));
        assert_eq!(config.mail.default_from.as_deref(), Some("briefs@example.com"));
        assert_eq!(config.observability.logging_level, "debug");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_invalid_numbers_fall_back() {
        clear_env();
        unsafe {
            env::set_var("QB_PORT", "not-a-port");
            env::set_var("QB_RETRY_MAX_ATTEMPTS", "-1");
        }

        let config = load_from_env().unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.retry.max_attempts, 3);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_api_key_counts_as_missing() {
        clear_env();
        unsafe {
            env::set_var("GROQ_API_KEY", "   ");
        }

        let config = load_from_env().unwrap();
        assert!(config.llm.api_key.is_none());

        clear_env();
    }
}
