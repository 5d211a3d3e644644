use std::sync::Arc;
use std::time::Duration;

use errors::BriefError;
use qb_core::{BriefRequest, Intent, LlmClient, Mode, ResponseEnvelope};
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, info, info_span};

use crate::classifier::IntentClassifier;
use crate::generators::{DirectResponder, SummaryResponder};
use crate::prompts::PromptSet;
use crate::retry::{RetryPolicy, RetryingLlm};

/// Settings shared by every model-backed stage.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub system_prompt: String,
    pub retry: RetryPolicy,
    pub history_window: usize,
    pub request_deadline: Duration,
    pub prompts: PromptSet
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&config::Config::default())
    }
}

impl PipelineSettings {
    pub fn from_config(config: &config::Config) -> Self {
        Self {
            system_prompt: config.llm.system_prompt.clone(),
            retry: RetryPolicy::from(&config.retry),
            history_window: config.pipeline.history_window,
            request_deadline: Duration::from_secs(config.pipeline.request_deadline_secs),
            prompts: PromptSet::default()
        }
    }
}

/// A failed request together with whatever intent was resolved before it
/// failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct BriefFailure {
    pub intent: Intent,
    pub error: BriefError
}

impl BriefFailure {
    fn new(intent: Intent, error: BriefError) -> Self {
        Self { intent, error }
    }
}

/// Entry point of the pipeline: classify, dispatch, generate, wrap.
///
/// Classification and generation share one deadline. Content problems in
/// model output never fail a request; only exhausted retries, an expired
/// deadline, missing configuration or an empty query do.
pub struct Orchestrator<C: LlmClient + ?Sized> {
    classifier: IntentClassifier<C>,
    direct: DirectResponder<C>,
    summary: SummaryResponder<C>,
    request_deadline: Duration
}

impl<C: LlmClient + ?Sized> Orchestrator<C> {
    pub fn new(llm: Arc<RetryingLlm<C>>, settings: &PipelineSettings) -> Self {
        let prompts = &settings.prompts;
        Self {
            classifier: IntentClassifier::new(
                llm.clone(),
                prompts.intent.clone(),
                settings.history_window
            ),
            direct: DirectResponder::new(
                llm.clone(),
                prompts.direct.clone(),
                settings.history_window
            ),
            summary: SummaryResponder::new(llm, prompts.summary.clone(), settings.history_window),
            request_deadline: settings.request_deadline
        }
    }

    pub async fn handle(&self, request: &BriefRequest) -> Result<ResponseEnvelope, BriefFailure> {
        let span = info_span!(
            "pipeline.orchestrate",
            history_length = request.history.len(),
            intent = tracing::field::Empty
        );

        async move {
            let query = request.query.trim();
            if query.is_empty() {
                return Err(BriefFailure::new(Intent::Unrecognized, BriefError::MissingQuery));
            }

            let deadline = Instant::now() + self.request_deadline;
            let expired = BriefError::DeadlineExceeded {
                secs: self.request_deadline.as_secs()
            };

            let classification = timeout_at(deadline, self.classifier.classify(query, &request.history))
                .await
                .map_err(|_| BriefFailure::new(Intent::Unrecognized, expired.clone()))?
                .map_err(|e| BriefFailure::new(Intent::Unrecognized, e))?;

            let intent = classification.intent;
            tracing::Span::current().record("intent", intent.label());

            let envelope = match intent.mode() {
                Mode::Direct => {
                    let result = timeout_at(deadline, self.direct.respond(query, &request.history))
                        .await
                        .map_err(|_| BriefFailure::new(intent, expired.clone()))?
                        .map_err(|e| BriefFailure::new(intent, e))?;
                    ResponseEnvelope::direct(intent, result)
                }
                Mode::Summary => {
                    let result =
                        timeout_at(deadline, self.summary.summarize(query, &request.history))
                            .await
                            .map_err(|_| BriefFailure::new(intent, expired.clone()))?
                            .map_err(|e| BriefFailure::new(intent, e))?;
                    ResponseEnvelope::summary(intent, result)
                }
            };

            info!(
                intent = %intent,
                mode = %intent.mode(),
                has_response = envelope.response.is_some(),
                "Request routed"
            );
            Ok(envelope)
        }
        .instrument(span)
        .await
    }
}
