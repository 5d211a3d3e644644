use std::sync::Mutex;

use async_trait::async_trait;
use errors::MailError;
use qb_core::{MailMessage, MailTransport};

/// Keeps every accepted message. Can be set to reject everything.
#[derive(Debug, Default)]
pub struct RecordingMailTransport {
    sent: Mutex<Vec<MailMessage>>,
    reject_with: Option<MailError>
}

impl RecordingMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(error: MailError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_with: Some(error)
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        if let Some(error) = &self.reject_with {
            return Err(error.clone());
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }

    fn is_configured(&self) -> bool {
        !matches!(self.reject_with, Some(MailError::NotConfigured { .. }))
    }
}
