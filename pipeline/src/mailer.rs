//! Turns a meeting summary into an email draft.
//!
//! Drafting never sends anything. Delivery is a separate, explicit call on a
//! `MailTransport`.

use std::sync::Arc;

use errors::BriefError;
use qb_core::{LlmClient, MailMessage, MeetingSummary};
use serde_json::{Value, json};
use tracing::{Instrument, info_span, warn};

use crate::extractor::extract_object;
use crate::prompts::PromptSpec;
use crate::retry::RetryingLlm;
use crate::telemetry::PipelineTelemetry;

pub const MAX_SUBJECT_CHARS: usize = 78;

const UNKNOWN_DATE: &str = "xx|xx|xxxx";

/// Addresses known to the caller. The model never supplies addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    pub to: Option<String>,
    pub from: Option<String>
}

pub struct EmailDrafter<C: LlmClient + ?Sized> {
    llm: Arc<RetryingLlm<C>>,
    spec: PromptSpec
}

impl<C: LlmClient + ?Sized> EmailDrafter<C> {
    pub fn new(llm: Arc<RetryingLlm<C>>, spec: PromptSpec) -> Self {
        Self { llm, spec }
    }

    pub async fn draft(
        &self,
        summary: &MeetingSummary,
        recipients: &Recipients
    ) -> Result<MailMessage, BriefError> {
        let span = info_span!(
            "pipeline.draft_email",
            has_to = recipients.to.is_some(),
            has_from = recipients.from.is_some()
        );

        async move {
            let query = json!({
                "summary": summary,
                "from": recipients.from.as_deref().unwrap_or_default(),
                "to": recipients.to.as_deref().unwrap_or_default()
            })
            .to_string();

            let prompt = self.spec.render(&[], &query, 0);
            let reply = self.llm.call("email", &prompt, &[]).await?;
            let decoded = extract_object(&reply);
            let body = decoded.get("message").unwrap_or(&Value::Null);

            let mut draft = match decode_draft(body) {
                Some(draft) => draft,
                None => {
                    warn!("Email draft could not be decoded, rendering from summary");
                    PipelineTelemetry::record_degraded("email");
                    fallback_draft(summary)
                }
            };

            draft.to = recipients.to.clone().unwrap_or_default();
            draft.from = recipients.from.clone().unwrap_or_default();
            draft.subject = truncate_subject(&draft.subject);
            Ok(draft)
        }
        .instrument(span)
        .await
    }
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn decode_draft(body: &Value) -> Option<MailMessage> {
    let subject = text_field(body, "subject")?;
    let text = text_field(body, "text");
    let html = text_field(body, "html");
    if text.is_none() && html.is_none() {
        return None;
    }

    Some(MailMessage {
        to: String::new(),
        from: String::new(),
        subject,
        text,
        html
    })
}

/// Cuts the subject to [`MAX_SUBJECT_CHARS`] characters.
pub fn truncate_subject(subject: &str) -> String {
    let subject = subject.trim();
    if subject.chars().count() <= MAX_SUBJECT_CHARS {
        return subject.to_string();
    }
    let cut: String = subject.chars().take(MAX_SUBJECT_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}

/// Renders a plain draft straight from the summary fields.
pub fn fallback_draft(summary: &MeetingSummary) -> MailMessage {
    let subject = match &summary.agenda {
        Some(agenda) => truncate_subject(&format!("Meeting summary: {agenda}")),
        None => "Meeting summary".to_string()
    };
    let date = summary.date.as_deref().unwrap_or(UNKNOWN_DATE);

    let sections: [(&str, Vec<String>); 4] = [
        ("Discussion points", summary.discussion_points.clone()),
        ("Decision made", summary.decision_made.iter().cloned().collect()),
        ("Action items", summary.action_items.clone()),
        ("Next steps", summary.next_steps.clone()),
    ];

    let mut text = format!("Meeting summary ({date})\n");
    let mut html = format!(
        "<main><p><strong>Meeting summary</strong> ({})</p>",
        escape_html(date)
    );

    if !summary.participants.is_empty() {
        let participants = summary.participants.join(", ");
        text.push_str(&format!("Participants: {participants}\n"));
        html.push_str(&format!(
            "<p><strong>Participants:</strong> {}</p>",
            escape_html(&participants)
        ));
    }

    for (title, items) in sections.iter().filter(|(_, items)| !items.is_empty()) {
        text.push_str(&format!("\n{title}:\n"));
        html.push_str(&format!("<p><strong>{title}</strong></p><ul>"));
        for item in items {
            text.push_str(&format!("- {item}\n"));
            html.push_str(&format!("<li>{}</li>", escape_html(item)));
        }
        html.push_str("</ul>");
    }
    html.push_str("</main>");

    MailMessage {
        to: String::new(),
        from: String::new(),
        subject,
        text: Some(text),
        html: Some(html)
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other)
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> MeetingSummary {
        MeetingSummary {
            date: None,
            participants: vec!["Alex".to_string(), "Priya".to_string()],
            agenda: Some("Pricing review".to_string()),
            discussion_points: vec!["Costs <high> & rising".to_string()],
            decision_made: Some("Send a proposal".to_string()),
            action_items: vec!["Alex to send proposal by Friday".to_string()],
            next_steps: Vec::new()
        }
    }

    #[test]
    fn test_truncate_subject() {
        assert_eq!(truncate_subject("  Weekly sync  "), "Weekly sync");

        let long = "a".repeat(120);
        let cut = truncate_subject(&long);
        assert_eq!(cut.chars().count(), MAX_SUBJECT_CHARS);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_fallback_draft_escapes_html() {
        let draft = fallback_draft(&summary());

        assert_eq!(draft.subject, "Meeting summary: Pricing review");
        let html = draft.html.unwrap();
        assert!(html.contains("Costs &lt;high&gt; &amp; rising"));
        assert!(html.contains("(xx|xx|xxxx)"));
        assert!(!html.contains("Next steps"));

        let text = draft.text.unwrap();
        assert!(text.contains("- Alex to send proposal by Friday"));
        assert!(text.contains("Participants: Alex, Priya"));
    }

    #[test]
    fn test_decode_draft_requires_subject_and_body() {
        assert!(decode_draft(&json!({"subject": "Hi"})).is_none());
        assert!(decode_draft(&json!({"text": "Body"})).is_none());

        let draft = decode_draft(&json!({"subject": "Hi", "html": "<p>Body</p>"})).unwrap();
        assert_eq!(draft.subject, "Hi");
        assert!(draft.text.is_none());
    }
}
