//! # Configuration Structures
//!
//! This module defines all configuration structures for QuickBrief.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Fill every missing field from a `default_*` function

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default system instructions sent ahead of every model call.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are QuickBrief, a helpful assistant that condenses meeting transcripts and documents into \
concise briefs and chats with the user about them. Maintain context from previous messages in \
the conversation and always answer in the JSON format the task asks for.";

/// Main configuration structure for QuickBrief.
///
/// This is the top-level configuration that aggregates all subsystem
/// configurations.
///
/// ## Usage
/// ```rust,no_run
/// use config::Config;
///
/// let config = Config::default();
/// println!("Model: {}", config.llm.model);
/// ```
///
/// ## Validation
/// All nested configurations must pass their own validation rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,

    /// Language model provider settings
    #[serde(default)]
    #[validate(nested)]
    pub llm: LlmConfig,

    /// Retry policy for model calls
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,

    /// Request pipeline settings
    #[serde(default)]
    #[validate(nested)]
    pub pipeline: PipelineConfig,

    /// Outbound email settings
    #[serde(default)]
    #[validate(nested)]
    pub mail: MailConfig,

    /// Metrics and logging settings
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    #[serde(default = "default_server_port")]
    #[validate(range(min = 1, max = 65535))]
    pub port: u16
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port()
        }
    }
}

/// Chat-completions provider. Defaults target Groq's OpenAI-compatible API.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct LlmConfig {
    /// Absent keys are reported as a configuration failure on first use
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    #[validate(length(min = 1, max = 255))]
    pub model: String,

    #[serde(default = "default_llm_base_url")]
    #[validate(custom(function = "validate_http_url"))]
    pub base_url: String,

    #[serde(default = "default_llm_timeout_secs")]
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,

    #[serde(default = "default_llm_system_prompt")]
    #[validate(length(min = 1))]
    pub system_prompt: String
}

fn default_llm_model() -> String {
    "deepseek-r1-distill-qwen-32b".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_llm_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            timeout_secs: default_llm_timeout_secs(),
            system_prompt: default_llm_system_prompt()
        }
    }
}

/// Fixed-delay retry policy for model calls.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(default = "default_retry_max_attempts")]
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: u32,

    /// Pause between attempts, not applied after the last one
    #[serde(default = "default_retry_delay_ms")]
    #[validate(range(min = 0, max = 60000))]
    pub delay_ms: u64
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            delay_ms: default_retry_delay_ms()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PipelineConfig {
    /// Budget for classification plus generation of one request
    #[serde(default = "default_request_deadline_secs")]
    #[validate(range(min = 1, max = 900))]
    pub request_deadline_secs: u64,

    /// Number of trailing turns rendered into task prompts
    #[serde(default = "default_history_window")]
    #[validate(range(min = 0, max = 100))]
    pub history_window: usize
}

fn default_request_deadline_secs() -> u64 {
    120
}

fn default_history_window() -> usize {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_deadline_secs: default_request_deadline_secs(),
            history_window: default_history_window()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct MailConfig {
    #[serde(default)]
    pub sendgrid_api_key: Option<String>,

    #[serde(default = "default_mail_base_url")]
    #[validate(custom(function = "validate_http_url"))]
    pub base_url: String,

    /// Sender used when a request leaves `from` empty
    #[serde(default)]
    pub default_from: Option<String>,

    /// Recipient used for drafts when no participant address is known
    #[serde(default)]
    pub default_to: Option<String>
}

fn default_mail_base_url() -> String {
    "https://api.sendgrid.com".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sendgrid_api_key: None,
            base_url: default_mail_base_url(),
            default_from: None,
            default_to: None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    /// Install the Prometheus recorder behind `/metrics`
    #[serde(default = "default_observability_metrics_enabled")]
    pub metrics_enabled: bool,

    /// Logging level
    #[serde(default = "default_observability_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String
}

fn default_observability_metrics_enabled() -> bool {
    true
}

fn default_observability_logging_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_observability_metrics_enabled(),
            logging_level: default_observability_logging_level()
        }
    }
}

fn validate_logging_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid logging level"))
    }
}

fn validate_http_url(value: &str) -> Result<(), validator::ValidationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(validator::ValidationError::new("URL must start with http:// or https://"))
    }
}
