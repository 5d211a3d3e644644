//! Shared test doubles for the QuickBrief workspace.
//!
//! - [`ScriptedLlmClient`] replays a queue of model replies and records every
//!   call it receives
//! - [`FailingLlmClient`] fails every call with one error
//! - [`RecordingMailTransport`] keeps sent mail in memory
//!
//! Plus a few canned transcripts and model replies in [`fixtures`].

pub mod fixtures;
mod llm;
mod mail;

pub use fixtures::*;
pub use llm::{FailingLlmClient, RecordedCall, ScriptedLlmClient};
pub use mail::RecordingMailTransport;
