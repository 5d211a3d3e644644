use std::sync::Arc;

use errors::BriefError;
use qb_core::{Intent, LlmClient, Message};
use serde_json::Value;
use tracing::{Instrument, debug, info_span, warn};

use crate::extractor::extract_object;
use crate::prompts::PromptSpec;
use crate::retry::RetryingLlm;
use crate::telemetry::PipelineTelemetry;

/// Outcome of intent classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// The label exactly as the model produced it, if any
    pub raw_label: Option<String>
}

pub struct IntentClassifier<C: LlmClient + ?Sized> {
    llm: Arc<RetryingLlm<C>>,
    spec: PromptSpec,
    history_window: usize
}

impl<C: LlmClient + ?Sized> IntentClassifier<C> {
    pub fn new(llm: Arc<RetryingLlm<C>>, spec: PromptSpec, history_window: usize) -> Self {
        Self {
            llm,
            spec,
            history_window
        }
    }

    /// Classifies the turn. Labels outside the closed set, and replies with no
    /// label at all, come back as [`Intent::Unrecognized`] rather than an
    /// error.
    pub async fn classify(
        &self,
        query: &str,
        history: &[Message]
    ) -> Result<Classification, BriefError> {
        let span = info_span!(
            "pipeline.classify",
            query_length = query.len(),
            history_length = history.len()
        );

        async move {
            let prompt = self.spec.render(history, query, self.history_window);
            let reply = self.llm.call("classify", &prompt, history).await?;
            let decoded = extract_object(&reply);

            let raw_label = decoded
                .get("intent")
                .and_then(Value::as_str)
                .map(str::to_string);
            let intent = raw_label
                .as_deref()
                .map_or(Intent::Unrecognized, Intent::from_label);

            if decoded.is_empty() {
                PipelineTelemetry::record_degraded("classify");
            }
            if intent.is_recognized() {
                debug!(intent = %intent, "Intent classified");
            } else {
                warn!(
                    raw_label = ?raw_label,
                    "Intent not recognized, falling back to direct response"
                );
            }
            PipelineTelemetry::record_intent(intent);

            Ok(Classification { intent, raw_label })
        }
        .instrument(span)
        .await
    }
}
