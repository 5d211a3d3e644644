//! Error types for the QuickBrief server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response}
};
use errors::{BriefError, ErrorClass, MailError};
use pipeline::BriefFailure;
use qb_core::ResponseEnvelope;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for the server.
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// A `/v1/brief` request that could not be served.
    #[error("{0}")]
    Brief(#[from] BriefFailure),

    #[error("{0}")]
    Pipeline(#[from] BriefError),

    #[error("{0}")]
    Mail(#[from] MailError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Server error: {message}")]
    Server { message: String }
}

impl AppError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Brief(failure) => failure.error.class(),
            Self::Pipeline(e) => e.class(),
            Self::Mail(e) => e.class(),
            Self::Configuration { .. } | Self::Server { .. } => ErrorClass::ConfigurationFailure
        }
    }
}

/// Error response body for HTTP endpoints.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>
}

/// Error body for `/v1/brief`: the usual envelope plus a machine code.
#[derive(Serialize)]
pub struct BriefErrorResponse {
    #[serde(flatten)]
    pub envelope: ResponseEnvelope,
    pub code: String
}

fn brief_status(error: &BriefError) -> (StatusCode, &'static str) {
    match error {
        BriefError::MissingQuery => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        BriefError::AttemptsExhausted { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
        }
        BriefError::DeadlineExceeded { .. } => (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED"),
        BriefError::Configuration { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Brief(failure) => {
                let (status, code) = brief_status(&failure.error);
                tracing::error!(
                    error = %failure.error,
                    intent = %failure.intent,
                    "Brief request failed"
                );
                let body = BriefErrorResponse {
                    envelope: ResponseEnvelope::failure(failure.intent),
                    code: code.to_string()
                };
                return (status, Json(body)).into_response();
            }
            Self::Pipeline(e) => {
                let (status, code) = brief_status(e);
                tracing::error!(error = %e, "Pipeline request failed");
                let message = match e {
                    BriefError::MissingQuery => e.to_string(),
                    _ => qb_core::GENERIC_FAILURE_MESSAGE.to_string()
                };
                (status, code, message, None)
            }
            Self::Mail(e) => {
                tracing::error!(error = %e, "Mail request failed");
                match e {
                    MailError::InvalidMessage { reason } => (
                        StatusCode::BAD_REQUEST,
                        "INVALID_REQUEST",
                        "Invalid email".to_string(),
                        Some(reason.clone())
                    ),
                    MailError::NotConfigured { reason } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONFIGURATION_ERROR",
                        reason.clone(),
                        None
                    ),
                    MailError::Rejected { .. } | MailError::Transport { .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "MAIL_DELIVERY_FAILED",
                        "Failed to send email".to_string(),
                        None
                    )
                }
            }
            Self::Configuration { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                message.clone(),
                None
            ),
            Self::Server { message } => {
                tracing::error!(message = %message, "Server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERVER_ERROR",
                    "An internal error occurred".to_string(),
                    None
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details
        };

        (status, Json(body)).into_response()
    }
}
