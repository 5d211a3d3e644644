use metrics::counter;
use qb_core::Intent;

/// Process-wide pipeline counters. Without an installed recorder the calls
/// are no-ops.
pub struct PipelineTelemetry;

impl PipelineTelemetry {
    pub fn record_intent(intent: Intent) {
        counter!("quickbrief_intents_total", "intent" => intent.label()).increment(1);
    }

    pub fn record_retry(stage: &'static str) {
        counter!("quickbrief_llm_retries_total", "stage" => stage).increment(1);
    }

    /// Model output that decoded to nothing usable.
    pub fn record_degraded(stage: &'static str) {
        counter!("quickbrief_decode_degraded_total", "stage" => stage).increment(1);
    }
}
