//! # QuickBrief Errors
//!
//! Error types shared by every QuickBrief crate.
//!
//! - Uses `thiserror` for structured error definitions
//! - Named fields in every variant so messages stay self-describing
//! - [`ErrorClass`] groups errors by how callers must react to them

use serde::Serialize;
use thiserror::Error;

/// How a failure must be handled by the caller.
///
/// `DecodeAmbiguity` and `UnrecognizedIntent` are never returned as errors.
/// They are recorded when the pipeline degrades so that telemetry can count
/// them alongside real failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    TransientProviderFailure,
    DecodeAmbiguity,
    UnrecognizedIntent,
    ConfigurationFailure,
    InvalidRequest
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransientProviderFailure => "transient_provider_failure",
            Self::DecodeAmbiguity => "decode_ambiguity",
            Self::UnrecognizedIntent => "unrecognized_intent",
            Self::ConfigurationFailure => "configuration_failure",
            Self::InvalidRequest => "invalid_request"
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language model provider errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("API request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Provider not configured: {reason}")]
    NotConfigured { reason: String },

    #[error("Timeout after {secs} seconds")]
    Timeout { secs: u64 }
}

impl LlmError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotConfigured { .. } => ErrorClass::ConfigurationFailure,
            _ => ErrorClass::TransientProviderFailure
        }
    }

    /// Missing configuration cannot be fixed by trying again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotConfigured { .. })
    }
}

/// Errors surfaced by the intent-routing pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BriefError {
    #[error("Query is missing or empty")]
    MissingQuery,

    #[error("All attempts failed ({attempts} tries), last error: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: LlmError },

    #[error("Request exceeded its deadline of {secs} seconds")]
    DeadlineExceeded { secs: u64 },

    #[error("Configuration error: {message}")]
    Configuration { message: String }
}

impl BriefError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingQuery => ErrorClass::InvalidRequest,
            Self::AttemptsExhausted { .. } | Self::DeadlineExceeded { .. } => {
                ErrorClass::TransientProviderFailure
            }
            Self::Configuration { .. } => ErrorClass::ConfigurationFailure
        }
    }
}

impl From<LlmError> for BriefError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::NotConfigured { reason } => Self::Configuration { message: reason },
            other => Self::AttemptsExhausted {
                attempts: 1,
                last_error: other
            }
        }
    }
}

/// Outbound email errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    #[error("Mail transport not configured: {reason}")]
    NotConfigured { reason: String },

    #[error("Invalid mail message: {reason}")]
    InvalidMessage { reason: String },

    #[error("Mail provider rejected the message with status {status}")]
    Rejected { status: u16, body: String },

    #[error("Mail transport failed: {reason}")]
    Transport { reason: String }
}

impl MailError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotConfigured { .. } => ErrorClass::ConfigurationFailure,
            Self::InvalidMessage { .. } => ErrorClass::InvalidRequest,
            Self::Rejected { .. } | Self::Transport { .. } => ErrorClass::TransientProviderFailure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_is_not_retryable() {
        let err = LlmError::NotConfigured {
            reason: "GROQ_API_KEY is not set".to_string()
        };
        assert!(!err.is_retryable());
        assert_eq!(err.class(), ErrorClass::ConfigurationFailure);
    }

    #[test]
    fn test_provider_failures_are_transient() {
        let errors = [
            LlmError::RequestFailed {
                reason: "502".to_string()
            },
            LlmError::RateLimited {
                retry_after_secs: 3
            },
            LlmError::Timeout { secs: 60 },
        ];
        for err in errors {
            assert!(err.is_retryable());
            assert_eq!(err.class(), ErrorClass::TransientProviderFailure);
        }
    }

    #[test]
    fn test_exhausted_message_names_all_attempts() {
        let err = BriefError::AttemptsExhausted {
            attempts: 3,
            last_error: LlmError::Timeout { secs: 60 }
        };
        let message = err.to_string();
        assert!(message.starts_with("All attempts failed"));
        assert!(message.contains("3 tries"));
    }

    #[test]
    fn test_llm_not_configured_converts_to_configuration() {
        let err: BriefError = LlmError::NotConfigured {
            reason: "missing key".to_string()
        }
        .into();
        assert_eq!(err.class(), ErrorClass::ConfigurationFailure);
    }

    #[test]
    fn test_mail_error_classes() {
        assert_eq!(
            MailError::NotConfigured {
                reason: "SendGrid API key is missing".to_string()
            }
            .class(),
            ErrorClass::ConfigurationFailure
        );
        assert_eq!(
            MailError::Rejected {
                status: 503,
                body: String::new()
            }
            .class(),
            ErrorClass::TransientProviderFailure
        );
    }
}
