//! Seams to the network collaborators.

use async_trait::async_trait;
use errors::{LlmError, MailError};

use crate::types::{MailMessage, Message};

/// Chat-style language model.
///
/// Implementations send `system`, then `history` in order, then `prompt` as a
/// user turn, and return the text content of the reply. A reply without
/// content is an empty string, not an error.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        history: &[Message],
        prompt: &str
    ) -> Result<String, LlmError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Transactional email delivery.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;

    fn is_configured(&self) -> bool {
        true
    }
}
