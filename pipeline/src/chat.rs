use std::sync::Arc;

use errors::BriefError;
use qb_core::{LlmClient, Message};
use tracing::{Instrument, info_span};

use crate::extractor::strip_reasoning;
use crate::retry::RetryingLlm;

/// Result of one plain chat turn: the reply and the caller's transcript with
/// both new turns appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub text: String,
    pub messages: Vec<Message>
}

/// Free-form multi-turn chat without intent routing. The transcript belongs
/// to the caller and is returned, never stored.
pub struct ChatResponder<C: LlmClient + ?Sized> {
    llm: Arc<RetryingLlm<C>>
}

impl<C: LlmClient + ?Sized> ChatResponder<C> {
    pub fn new(llm: Arc<RetryingLlm<C>>) -> Self {
        Self { llm }
    }

    pub async fn reply(&self, prompt: &str, history: &[Message]) -> Result<ChatTurn, BriefError> {
        let span = info_span!("pipeline.chat", history_length = history.len());

        async move {
            let prompt = prompt.trim();
            if prompt.is_empty() {
                return Err(BriefError::MissingQuery);
            }

            let reply = self.llm.call("chat", prompt, history).await?;
            let text = strip_reasoning(&reply).trim().to_string();

            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.extend_from_slice(history);
            messages.push(Message::user(prompt));
            messages.push(Message::assistant(text.clone()));

            Ok(ChatTurn { text, messages })
        }
        .instrument(span)
        .await
    }
}
