//! HTTP request handlers for the QuickBrief server.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use qb_core::{
    BriefRequest, MailMessage, MeetingSummary, Message, ResponseEnvelope, Role, STATUS_OK
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::telemetry::{RequestTimer, Telemetry};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub llm_configured: bool,
    pub mail_configured: bool
}

/// Health check endpoint.
///
/// Always 200 while the process serves requests. Missing provider keys are
/// reported, not treated as unhealthy.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        llm_configured: state.llm.is_configured(),
        mail_configured: state.mail.is_configured()
    })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "Metrics are disabled".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct BriefBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub messages: Vec<Message>
}

/// Clients often send the transcript with the current turn already appended.
/// That turn is the query, so it is not history.
fn history_before(query: &str, mut messages: Vec<Message>) -> Vec<Message> {
    let is_current_turn = messages
        .last()
        .is_some_and(|last| last.role == Role::User && last.content.trim() == query.trim());
    if is_current_turn {
        messages.pop();
    }
    messages
}

/// POST /v1/brief
pub async fn brief(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BriefBody>
) -> Result<Json<ResponseEnvelope>> {
    let timer = RequestTimer::new("brief");
    let history = history_before(&body.query, body.messages);
    let request = BriefRequest::new(body.query, history);

    let result = state.orchestrator.handle(&request).await;
    timer.finish();

    result.map(Json).map_err(|failure| {
        Telemetry::record_error("brief", failure.error.class());
        AppError::Brief(failure)
    })
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub messages: Vec<Message>
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: String,
    pub data: GenerateData
}

#[derive(Debug, Serialize)]
pub struct GenerateData {
    pub text: String,
    pub messages: Vec<Message>,
    pub conversation_length: usize
}

/// POST /v1/generate
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateBody>
) -> Result<Json<GenerateResponse>> {
    let timer = RequestTimer::new("generate");
    let result = state.chat.reply(&body.prompt, &body.messages).await;
    timer.finish();

    let turn = result.map_err(|e| {
        Telemetry::record_error("generate", e.class());
        AppError::Pipeline(e)
    })?;

    Ok(Json(GenerateResponse {
        status: STATUS_OK.to_string(),
        data: GenerateData {
            text: turn.text,
            conversation_length: turn.messages.len(),
            messages: turn.messages
        }
    }))
}

#[derive(Debug, Deserialize)]
pub struct DraftBody {
    pub summary: MeetingSummary,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub status: String,
    pub draft: MailMessage
}

/// POST /v1/mail/draft
///
/// Returns the draft for the caller to review. Nothing is sent.
pub async fn draft_mail(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DraftBody>
) -> Result<Json<DraftResponse>> {
    let timer = RequestTimer::new("mail_draft");
    let recipients = state.recipients(body.to, body.from);
    let result = state.drafter.draft(&body.summary, &recipients).await;
    timer.finish();

    let draft = result.map_err(|e| {
        Telemetry::record_error("mail_draft", e.class());
        AppError::Pipeline(e)
    })?;

    Ok(Json(DraftResponse {
        status: STATUS_OK.to_string(),
        draft
    }))
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool
}

/// POST /v1/mail/send
pub async fn send_mail(
    State(state): State<Arc<AppState>>,
    Json(mut message): Json<MailMessage>
) -> Result<Json<SendResponse>> {
    let timer = RequestTimer::new("mail_send");
    if message.from.trim().is_empty() {
        if let Some(default_from) = &state.config.mail.default_from {
            message.from = default_from.clone();
        }
    }

    let result = state.mail.send(&message).await;
    timer.finish();

    result.map_err(|e| {
        Telemetry::record_error("mail_send", e.class());
        AppError::Mail(e)
    })?;

    tracing::info!(to = %message.to, "Confirmed email sent");
    Ok(Json(SendResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_before_drops_current_turn() {
        let messages = vec![
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("Summarize the call"),
        ];

        let history = history_before("Summarize the call", messages);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[test]
    fn test_history_before_keeps_other_turns() {
        let messages = vec![Message::user("Hi"), Message::assistant("Summarize the call")];
        assert_eq!(history_before("Summarize the call", messages).len(), 2);

        let messages = vec![Message::user("Something else")];
        assert_eq!(history_before("Summarize the call", messages).len(), 1);
    }
}
