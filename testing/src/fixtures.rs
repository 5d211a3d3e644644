//! Canned transcripts and model replies.

use std::sync::atomic::{AtomicU32, Ordering};

use qb_core::Message;
use serde_json::json;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// A sales call transcript long enough that a faithful summary is much
/// shorter than the input.
pub const SALES_TRANSCRIPT: &str = "Summarize this meeting. Alex (Sales Director): Thanks \
    everyone for joining. Today we want to walk Finlytics through our analytics platform and \
    talk about pricing. Priya (Finlytics CTO): Great. Our main concern is ingesting data from \
    our existing warehouse without a long migration. Alex: Our connectors cover the warehouse \
    you use today, and onboarding usually takes about two weeks. Priya: What does pricing look \
    like for a team of our size? Alex: For forty analysts the enterprise tier starts at twelve \
    thousand dollars per month, and that includes dedicated support. Priya: That is within \
    budget if the onboarding timeline holds. We would also like a case study from a similar \
    customer. Priya: Do you also support single sign-on for our analysts? Alex: Yes, single \
    sign-on is included in the enterprise tier at no extra cost. Alex: I will send a proposal with the pricing breakdown and a case study by \
    Friday. Priya: Perfect, then we can schedule a technical deep dive next week with our data \
    engineers. Alex: Sounds good, I will coordinate the calendar invite.";

pub fn classification_reply(label: &str) -> String {
    json!({ "intent": label }).to_string()
}

pub fn direct_reply(text: &str) -> String {
    json!({ "response": text }).to_string()
}

/// A model reply with a reasoning block and a fenced structured summary.
pub fn sales_summary_reply() -> String {
    let body = json!({
        "response": {
            "date": "xx|xx|xxxx",
            "participants": ["Alex (Sales Director)", "Priya (Finlytics CTO)"],
            "agenda": "Analytics platform demo and pricing",
            "discussion_points": [
                "Warehouse connectors, two week onboarding",
                "Enterprise tier at $12k per month for 40 analysts"
            ],
            "decision_made": "Pricing is within budget if onboarding holds",
            "action_items": ["Alex sends proposal and case study by Friday"],
            "next_steps": ["Technical deep dive next week"]
        },
        "action": "Alex to send the proposal by Friday"
    });
    format!(
        "<think>The user wants a summary of the call.</think>\n```json\n{}\n```",
        serde_json::to_string_pretty(&body).unwrap_or_default()
    )
}

/// A short conversation that mentions a meeting.
pub fn meeting_history() -> Vec<Message> {
    vec![
        Message::user("I have a sales call with Finlytics this afternoon."),
        Message::assistant("Share the notes afterwards and I can summarize them."),
    ]
}
