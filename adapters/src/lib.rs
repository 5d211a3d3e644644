//! Network adapters for the QuickBrief seams: the chat completions provider
//! behind [`qb_core::LlmClient`] and SendGrid behind
//! [`qb_core::MailTransport`].

pub mod llm;
pub mod mail;

pub use llm::ChatCompletionsClient;
pub use mail::{SendGridTransport, check_message};
