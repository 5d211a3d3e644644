//! OpenAI-compatible chat completions client (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use errors::LlmError;
use qb_core::{LlmClient, Message, Role};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>
}

pub struct ChatCompletionsClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    client: reqwest::Client
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::NotConfigured {
                reason: format!("Failed to build HTTP client: {e}")
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            timeout,
            client
        })
    }

    pub fn from_config(config: &config::LlmConfig) -> Result<Self, LlmError> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs)
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_send_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout {
                secs: self.timeout.as_secs()
            }
        } else {
            LlmError::RequestFailed {
                reason: error.to_string()
            }
        }
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(
        &self,
        system: &str,
        history: &[Message],
        prompt: &str
    ) -> Result<String, LlmError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(LlmError::NotConfigured {
                reason: "GROQ_API_KEY is not set".to_string()
            });
        };

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: Role::System,
            content: system
        });
        messages.extend(history.iter().map(|m| ChatMessage {
            role: m.role,
            content: &m.content
        }));
        messages.push(ChatMessage {
            role: Role::User,
            content: prompt
        });

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, messages = messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&ChatRequest {
                model: &self.model,
                messages
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        match response.status() {
            status if status.is_success() => {
                let body: ChatResponse =
                    response
                        .json()
                        .await
                        .map_err(|e| LlmError::InvalidResponse {
                            reason: e.to_string()
                        })?;

                Ok(body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message)
                    .and_then(|message| message.content)
                    .unwrap_or_default())
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                warn!(retry_after, "Chat completion rate limited");
                Err(LlmError::RateLimited {
                    retry_after_secs: retry_after
                })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(LlmError::RequestFailed {
                    reason: format!("HTTP {}: {}", status.as_u16(), body)
                })
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
