use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use errors::{BriefError, LlmError};
use qb_core::{LlmClient, Message};
use tokio_retry::strategy::FixedInterval;
use tracing::{error, warn};

use crate::telemetry::PipelineTelemetry;

/// Fixed-delay retry policy: `max_attempts` calls in total, `delay` between
/// consecutive attempts and none after the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1500)
        }
    }
}

impl From<&config::RetryConfig> for RetryPolicy {
    fn from(config: &config::RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: Duration::from_millis(config.delay_ms)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryMetrics {
    attempts_total: Arc<AtomicU64>,
    retries_total: Arc<AtomicU64>,
    exhausted_total: Arc<AtomicU64>
}

impl RetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.attempts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exhausted(&self) {
        self.exhausted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempts_total(&self) -> u64 {
        self.attempts_total.load(Ordering::Relaxed)
    }

    pub fn retries_total(&self) -> u64 {
        self.retries_total.load(Ordering::Relaxed)
    }

    pub fn exhausted_total(&self) -> u64 {
        self.exhausted_total.load(Ordering::Relaxed)
    }
}

/// Runs `operation` until it succeeds or the policy is used up.
///
/// `operation` receives the 1-based attempt number. Errors that retrying
/// cannot fix end the loop at once. After the last attempt the error is
/// folded into a single [`BriefError::AttemptsExhausted`].
pub async fn retry_with_fixed_delay<F, Fut, T>(
    policy: &RetryPolicy,
    metrics: &RetryMetrics,
    stage: &'static str,
    operation: F
) -> Result<T, BriefError>
where
    F: Fn(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, LlmError>>
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delays = FixedInterval::new(policy.delay).take(max_attempts as usize - 1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        metrics.record_attempt();

        let last_error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                error!(stage, error = %e, "Model provider is not configured");
                return Err(e.into());
            }
            Err(e) => e
        };

        warn!(stage, attempt, max_attempts, error = %last_error, "Model call attempt failed");

        match delays.next() {
            Some(delay) => {
                metrics.record_retry();
                PipelineTelemetry::record_retry(stage);
                tokio::time::sleep(delay).await;
            }
            None => {
                metrics.record_exhausted();
                error!(stage, attempts = max_attempts, "All model call attempts failed");
                return Err(BriefError::AttemptsExhausted {
                    attempts: max_attempts,
                    last_error
                });
            }
        }
    }
}

/// A language model client bound to the system instructions and the retry
/// policy. Every pipeline stage calls the model through one of these.
pub struct RetryingLlm<C: LlmClient + ?Sized> {
    client: Arc<C>,
    system_prompt: String,
    policy: RetryPolicy,
    metrics: RetryMetrics
}

impl<C: LlmClient + ?Sized> RetryingLlm<C> {
    pub fn new(client: Arc<C>, system_prompt: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            policy,
            metrics: RetryMetrics::new()
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &RetryMetrics {
        &self.metrics
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Sends `[system] + history + [prompt as user]` and returns the raw text.
    pub async fn call(
        &self,
        stage: &'static str,
        prompt: &str,
        history: &[Message]
    ) -> Result<String, BriefError> {
        retry_with_fixed_delay(&self.policy, &self.metrics, stage, |_attempt| {
            self.client.complete(&self.system_prompt, history, prompt)
        })
        .await
    }
}
