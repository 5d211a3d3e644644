//! Mode-specific response generators.
//!
//! Both generators always call the model, even when the query holds nothing
//! to work with. A reply that cannot be decoded yields an empty result and a
//! degraded-decode metric, never an error.

use std::sync::Arc;

use errors::BriefError;
use qb_core::{DirectResult, LlmClient, MeetingSummary, Message, SummaryBody, SummaryResult};
use serde_json::{Map, Value};
use tracing::{Instrument, info_span, warn};

use crate::extractor::extract_object;
use crate::prompts::PromptSpec;
use crate::retry::RetryingLlm;
use crate::telemetry::PipelineTelemetry;

/// Conversational replies (`{"response": "<text>"}`).
pub struct DirectResponder<C: LlmClient + ?Sized> {
    llm: Arc<RetryingLlm<C>>,
    spec: PromptSpec,
    history_window: usize
}

impl<C: LlmClient + ?Sized> DirectResponder<C> {
    pub fn new(llm: Arc<RetryingLlm<C>>, spec: PromptSpec, history_window: usize) -> Self {
        Self {
            llm,
            spec,
            history_window
        }
    }

    pub async fn respond(
        &self,
        query: &str,
        history: &[Message]
    ) -> Result<DirectResult, BriefError> {
        let span = info_span!("pipeline.generate_direct", query_length = query.len());

        async move {
            let prompt = self.spec.render(history, query, self.history_window);
            let reply = self.llm.call("direct", &prompt, history).await?;
            let result = decode_direct(&extract_object(&reply));

            if result.is_degraded() {
                warn!(reply_length = reply.len(), "Direct reply carried no response field");
                PipelineTelemetry::record_degraded("direct");
            }
            Ok(result)
        }
        .instrument(span)
        .await
    }
}

fn decode_direct(decoded: &Map<String, Value>) -> DirectResult {
    let response = match decoded.get("response") {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Null | Value::String(_)) | None => None,
        Some(other) => Some(other.to_string())
    };
    DirectResult { response }
}

/// Structured meeting summaries.
pub struct SummaryResponder<C: LlmClient + ?Sized> {
    llm: Arc<RetryingLlm<C>>,
    spec: PromptSpec,
    history_window: usize
}

impl<C: LlmClient + ?Sized> SummaryResponder<C> {
    pub fn new(llm: Arc<RetryingLlm<C>>, spec: PromptSpec, history_window: usize) -> Self {
        Self {
            llm,
            spec,
            history_window
        }
    }

    pub async fn summarize(
        &self,
        query: &str,
        history: &[Message]
    ) -> Result<SummaryResult, BriefError> {
        let span = info_span!(
            "pipeline.generate_summary",
            query_length = query.len(),
            history_length = history.len()
        );

        async move {
            let prompt = self.spec.render(history, query, self.history_window);
            let reply = self.llm.call("summary", &prompt, history).await?;
            let result = decode_summary(&extract_object(&reply));

            if result.is_degraded() {
                warn!(reply_length = reply.len(), "Summary reply could not be decoded");
                PipelineTelemetry::record_degraded("summary");
            }
            Ok(result)
        }
        .instrument(span)
        .await
    }
}

fn decode_summary(decoded: &Map<String, Value>) -> SummaryResult {
    let response = match decoded.get("response") {
        Some(Value::String(text)) if !text.trim().is_empty() => {
            Some(SummaryBody::Text(text.trim().to_string()))
        }
        Some(value @ Value::Object(_)) => structured(value),
        Some(_) => None,
        // Some models drop the wrapper and answer with the record itself.
        None => structured(&Value::Object(decoded.clone()))
    };

    let action = match decoded.get("action") {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None
    };

    SummaryResult { response, action }
}

fn structured(value: &Value) -> Option<SummaryBody> {
    MeetingSummary::from_value(value)
        .filter(|summary| !summary.is_empty())
        .map(SummaryBody::Structured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new()
        }
    }

    #[test]
    fn test_decode_direct_text() {
        let result = decode_direct(&as_map(json!({"response": "  Happy to help!  "})));
        assert_eq!(result.response.as_deref(), Some("Happy to help!"));
    }

    #[test]
    fn test_decode_direct_missing_or_blank() {
        assert!(decode_direct(&Map::new()).is_degraded());
        assert!(decode_direct(&as_map(json!({"response": "   "}))).is_degraded());
        assert!(decode_direct(&as_map(json!({"response": null}))).is_degraded());
    }

    #[test]
    fn test_decode_direct_stringifies_non_text() {
        let result = decode_direct(&as_map(json!({"response": {"greeting": "hi"}})));
        assert_eq!(result.response.as_deref(), Some("{\"greeting\":\"hi\"}"));
    }

    #[test]
    fn test_decode_summary_structured() {
        let result = decode_summary(&as_map(json!({
            "response": {
                "participants": ["Alex", "Priya"],
                "discussion_points": ["Budget approved"]
            },
            "action": "Send proposal"
        })));

        match result.response {
            Some(SummaryBody::Structured(summary)) => {
                assert_eq!(summary.participants, vec!["Alex", "Priya"]);
                assert_eq!(summary.discussion_points, vec!["Budget approved"]);
            }
            other => panic!("expected structured summary, got {other:?}")
        }
        assert_eq!(result.action.as_deref(), Some("Send proposal"));
    }

    #[test]
    fn test_decode_summary_text() {
        let result = decode_summary(&as_map(json!({"response": "The team agreed to ship."})));
        assert_eq!(
            result.response,
            Some(SummaryBody::Text("The team agreed to ship.".to_string()))
        );
        assert!(result.action.is_none());
    }

    #[test]
    fn test_decode_summary_without_wrapper() {
        let result = decode_summary(&as_map(json!({
            "discussion_points": ["Pricing starts at $12k per month"],
            "action": ["Draft proposal", "Share case study"]
        })));

        assert!(matches!(result.response, Some(SummaryBody::Structured(_))));
        assert_eq!(
            result.action.as_deref(),
            Some("Draft proposal; Share case study")
        );
    }

    #[test]
    fn test_decode_summary_empty_is_degraded() {
        assert!(decode_summary(&Map::new()).is_degraded());
        assert!(decode_summary(&as_map(json!({"response": {}}))).is_degraded());
        assert!(decode_summary(&as_map(json!({"response": [1, 2]}))).is_degraded());
    }
}
