use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use errors::LlmError;
use qb_core::{LlmClient, Message};

/// One request as seen by a test double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system: String,
    pub history: Vec<Message>,
    pub prompt: String
}

/// Replays scripted replies in order. Once the script runs dry every call
/// fails with a `RequestFailed` error.
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
    unconfigured: bool
}

impl ScriptedLlmClient {
    pub fn new(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Script made only of successful replies.
    pub fn with_replies<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self::new(replies.into_iter().map(|r| Ok(r.into())))
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.unconfigured = true;
        self
    }

    pub fn push_reply(&self, reply: Result<String, LlmError>) {
        lock(&self.replies).push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(
        &self,
        system: &str,
        history: &[Message],
        prompt: &str
    ) -> Result<String, LlmError> {
        lock(&self.calls).push(RecordedCall {
            system: system.to_string(),
            history: history.to_vec(),
            prompt: prompt.to_string()
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        lock(&self.replies).pop_front().unwrap_or_else(|| {
            Err(LlmError::RequestFailed {
                reason: "no scripted reply left".to_string()
            })
        })
    }

    fn is_configured(&self) -> bool {
        !self.unconfigured
    }
}

/// Fails every call with the same error.
#[derive(Debug)]
pub struct FailingLlmClient {
    error: LlmError,
    calls: AtomicU32
}

impl FailingLlmClient {
    pub fn new(error: LlmError) -> Self {
        Self {
            error,
            calls: AtomicU32::new(0)
        }
    }

    pub fn unavailable() -> Self {
        Self::new(LlmError::RequestFailed {
            reason: "HTTP 503: service unavailable".to_string()
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(
        &self,
        _system: &str,
        _history: &[Message],
        _prompt: &str
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    fn is_configured(&self) -> bool {
        !matches!(self.error, LlmError::NotConfigured { .. })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
