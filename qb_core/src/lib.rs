//! # QuickBrief Core
//!
//! Shared types and traits for the QuickBrief system.
//!
//! This crate provides:
//! - Chat transcript types ([`Message`], [`Role`])
//! - The closed intent set and its routing ([`Intent`], [`Mode`])
//! - Mode results and the response envelope
//! - Seam traits for the language model and the mail transport

pub mod traits;
pub mod types;

pub use traits::{LlmClient, MailTransport};
pub use types::{
    BriefRequest, BriefResponse, DirectResult, GENERIC_FAILURE_MESSAGE, Intent, MailMessage,
    MeetingSummary, Message, Mode, ResponseEnvelope, Role, STATUS_ERROR, STATUS_OK, SummaryBody,
    SummaryResult
};
