//! # QuickBrief Pipeline
//!
//! Intent classification, mode dispatch and response generation.
//!
//! Every stage talks to the model through a [`RetryingLlm`], decodes the
//! reply with the tolerant [`extractor`] and degrades to an empty result
//! instead of failing when the reply cannot be read.

pub mod chat;
pub mod classifier;
pub mod extractor;
pub mod generators;
pub mod mailer;
pub mod orchestrator;
pub mod prompts;
pub mod retry;
pub mod telemetry;

pub use chat::{ChatResponder, ChatTurn};
pub use classifier::{Classification, IntentClassifier};
pub use extractor::{clean_reply, extract_object, parse_partial, strip_reasoning};
pub use generators::{DirectResponder, SummaryResponder};
pub use mailer::{EmailDrafter, Recipients};
pub use orchestrator::{BriefFailure, Orchestrator, PipelineSettings};
pub use prompts::{FewShotExample, PromptSet, PromptSpec, render_history};
pub use retry::{RetryMetrics, RetryPolicy, RetryingLlm, retry_with_fixed_delay};
pub use telemetry::PipelineTelemetry;
