//! Declarative prompt specifications.
//!
//! Each mode owns a [`PromptSpec`]: free-form instructions, worked examples
//! and the JSON shape the model must answer with. Specs render to one task
//! prompt; control flow never concatenates prompt text itself.

use qb_core::{Message, Role};
use serde::{Deserialize, Serialize};

/// One worked example shown to the model before the real input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    #[serde(default)]
    pub history: Vec<Message>,
    pub query: String,
    pub output: String
}

impl FewShotExample {
    pub fn new(history: Vec<Message>, query: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            history,
            query: query.into(),
            output: output.into()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub instructions: String,
    #[serde(default)]
    pub examples: Vec<FewShotExample>,
    pub schema: String
}

impl PromptSpec {
    /// Renders the task prompt for `query`, embedding the last
    /// `history_window` turns of `history`.
    pub fn render(&self, history: &[Message], query: &str, history_window: usize) -> String {
        let mut prompt = String::with_capacity(self.instructions.len() + query.len() + 512);

        prompt.push_str(self.instructions.trim());
        prompt.push_str("\n\nRespond with JSON in exactly this shape:\n");
        prompt.push_str(self.schema.trim());
        prompt.push_str("\n\n-----\n");

        for (index, example) in self.examples.iter().enumerate() {
            prompt.push_str(&format!("\n**Example {}:**\n\n", index + 1));
            push_exchange(&mut prompt, &example.history, usize::MAX, &example.query);
            prompt.push_str(example.output.trim());
            prompt.push_str("\n\n-----\n");
        }

        prompt.push_str("\n**Your Task:**\n\n**Analyze the following input:**\n\n");
        push_exchange(&mut prompt, history, history_window, query);
        prompt
    }
}

fn push_exchange(prompt: &mut String, history: &[Message], window: usize, query: &str) {
    prompt.push_str("**Chat History:**\n");
    prompt.push_str(&render_history(history, window));
    prompt.push_str("\n\n**User Query:**\n");
    prompt.push_str(query.trim());
    prompt.push_str("\n\n**Output:**\n");
}

/// Renders the last `window` turns as `User: "..."` / `Bot: "..."` lines.
pub fn render_history(history: &[Message], window: usize) -> String {
    let skip = history.len().saturating_sub(window);
    let lines: Vec<String> = history
        .iter()
        .skip(skip)
        .map(|message| {
            let speaker = match message.role {
                Role::User => "User",
                Role::Assistant => "Bot",
                Role::System => "System"
            };
            format!("{speaker}: \"{}\"", message.content.trim())
        })
        .collect();

    if lines.is_empty() {
        "(no previous messages)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Prompt specs for every model-backed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    pub intent: PromptSpec,
    pub direct: PromptSpec,
    pub summary: PromptSpec,
    pub email: PromptSpec
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            intent: intent_spec(),
            direct: direct_spec(),
            summary: summary_spec(),
            email: email_spec()
        }
    }
}

fn intent_spec() -> PromptSpec {
    PromptSpec {
        instructions: INTENT_INSTRUCTIONS.to_string(),
        examples: vec![
            FewShotExample::new(
                vec![
                    Message::user("Hey, what's up?"),
                    Message::assistant(
                        "Not much, just here to help you summarize anything you'd like to \
                         condense. Want to talk about something specific?"
                    ),
                    Message::user("I have a meeting today but I won't be able to attend it."),
                    Message::assistant(
                        "No problem, I can summarize it for you. Share the transcript or notes \
                         when you have them."
                    ),
                ],
                "\"Can you summarize the key points from the meeting on Sales?\"",
                r#"{"intent": "Summary Mode"}"#
            ),
            FewShotExample::new(
                vec![
                    Message::user("Can you explain the concept of Agenda?"),
                    Message::assistant(
                        "The planned discussion points for the meeting. It lets the summary \
                         follow the intended focus areas and flag skipped items."
                    ),
                ],
                "\"Awesome, thanks so much!\"",
                r#"{"intent": "Misc Mode"}"#
            ),
        ],
        schema: r#"{"intent": "<Summary Mode | Misc Mode>"}"#.to_string()
    }
}

fn direct_spec() -> PromptSpec {
    PromptSpec {
        instructions: DIRECT_INSTRUCTIONS.to_string(),
        examples: Vec::new(),
        schema: r#"{"response": "<reply to the user's latest query>"}"#.to_string()
    }
}

fn summary_spec() -> PromptSpec {
    PromptSpec {
        instructions: SUMMARY_INSTRUCTIONS.to_string(),
        examples: vec![FewShotExample::new(
            vec![
                Message::user("Hey, can you help me summarize a meeting?"),
                Message::assistant("Of course! What topic are you focusing on today?"),
                Message::user("Focusing on Sales today."),
                Message::assistant("Feel free to drop in the transcript."),
            ],
            SUMMARY_EXAMPLE_QUERY,
            SUMMARY_EXAMPLE_OUTPUT
        )],
        schema: SUMMARY_SCHEMA.to_string()
    }
}

fn email_spec() -> PromptSpec {
    PromptSpec {
        instructions: EMAIL_INSTRUCTIONS.to_string(),
        examples: Vec::new(),
        schema: EMAIL_SCHEMA.to_string()
    }
}

const INTENT_INSTRUCTIONS: &str = "\
You are an expert intent classifier for a chatbot that summarizes meetings and sends the \
summaries by email. Analyze the user's query together with the recent chat history and decide \
what the user wants.

Classify the intent into exactly one of: [\"Summary Mode\", \"Misc Mode\"].

* Summary Mode: requests to summarize information, condense text, or extract key points from \
meeting transcripts, emails or other documents that are provided.
* Misc Mode: greetings, goodbyes, thank yous, questions about why, what or how, and any other \
conversation that does not ask for a summary.

Do not set the intent blindly. Use Summary Mode only when a transcript or document is available \
and the user clearly asks for it to be condensed. Answer with the intent key only.";

const DIRECT_INSTRUCTIONS: &str = "\
You are a helpful summarization chatbot. Converse with the user in a friendly and engaging \
manner and reply to their latest query, taking the chat history into account.";

const SUMMARY_INSTRUCTIONS: &str = "\
You are a meeting summarization agent. Read the meeting transcript in the query and return a \
concise summary of its key points.

Content guidelines:
- Capture the main topics, decisions, action items, blockers and timelines.
- Keep important numbers, dates and commitments, and note who is responsible where possible.
- The narrative core is 3 to 6 sentences. Leave out greetings, filler and irrelevant chatter.
- If a field is not present in the transcript use null or an empty list. Do not invent details.

Style:
- Neutral and factual tone, past tense for what happened, no commentary or speculation.

Strictness:
- Never output text outside the JSON object and never wrap it in code fences.
- The JSON must always be syntactically valid.";

const SUMMARY_SCHEMA: &str = r#"{
  "response": {
    "date": "<meeting date or null>",
    "participants": ["<name>"],
    "agenda": "<1 to 2 lines or null>",
    "discussion_points": ["<main discussion highlight>"],
    "decision_made": "<what was agreed on>",
    "action_items": ["<owner and task>"],
    "next_steps": ["<next meeting, checkpoint or milestone>"]
  },
  "action": "<next steps or actions to be taken>"
}"#;

const SUMMARY_EXAMPLE_QUERY: &str = "\
\"Can you summarize the key points from this meeting transcript? Transcript:

Alex: Thanks for joining today, Priya. I would like to learn more about Finlytics and see where \
our platform might help. Could you start by telling me about your current setup?
Priya: Sure. We run analytics pipelines for 40+ enterprise clients on a mix of AWS Glue and \
Snowflake, but managing data ingestion has been difficult. Our main issue is scaling with cost \
efficiency.
Jordan: Could you give an example of a bottleneck?
Priya: Our monthly ETL jobs are expensive, and queries fail when concurrency spikes. We also \
lack strong monitoring.
Alex: Are you mainly looking to optimize cost or reliability?
Priya: Both, but cost is the number one driver. We spend around $250k annually on ETL.
Alex: Our orchestration engine reduces redundant compute cycles and our monitoring layer sends \
real-time alerts. Customers have cut costs by 30 to 40%.
Jordan: We also support native connectors for AWS and Snowflake, so migration would be minimal.
Priya: What does onboarding look like?
Alex: A 2-week pilot where our team handles most of the setup, then full deployment in 6 to 8 \
weeks.
Priya: Pricing is obviously important.
Alex: For enterprises of your scale pricing starts at $12k per month plus variable storage.
Priya: That is within our range. I would like a proposal to review internally.
Alex: We will send a proposal by Friday.
Jordan: We can include a case study from a similar fintech client.
Priya: Great, please do.\"";

const SUMMARY_EXAMPLE_OUTPUT: &str = r#"{
  "response": {
    "date": null,
    "participants": ["Alex", "Priya", "Jordan"],
    "agenda": "Review Finlytics' analytics setup and how the platform could improve cost and reliability.",
    "discussion_points": [
      "Finlytics runs analytics pipelines for 40+ enterprise clients on AWS Glue and Snowflake.",
      "Issues included high ETL costs, concurrency-related query failures and weak monitoring.",
      "Cost was the primary concern, with annual ETL spend of about $250k.",
      "The platform offered orchestration, real-time monitoring and AWS/Snowflake connectors, citing 30-40% savings.",
      "Onboarding is a 2-week pilot followed by 6-8 weeks of deployment; pricing starts at $12k per month plus storage."
    ],
    "decision_made": "Priya requested a proposal for internal review.",
    "action_items": [
      "Alex to send a proposal to Priya by Friday.",
      "Jordan to include a fintech case study in the proposal."
    ],
    "next_steps": [
      "Finlytics reviews the proposal internally.",
      "Follow-up discussion based on the proposal evaluation."
    ]
  },
  "action": "Alex sends the proposal with a fintech case study by Friday."
}"#;

const EMAIL_INSTRUCTIONS: &str = "\
You are QuickBrief Mailer, an expert email formatter. The query holds a meeting summary as JSON \
and the known sender and recipient addresses.

Tasks:
1. Use only the addresses given in the query. Never invent emails, names or URLs. Leave an \
address empty when none is given.
2. Write a crisp subject of at most 78 characters from the agenda and discussion points.
3. Produce a plain-text body and an HTML body with matching content: short paragraphs, bullet \
lists built from the discussion points, the decision made and the action items, and clear next \
steps. Use xx|xx|xxxx when the date is unknown.
4. HTML uses semantic tags (<main>, <p>, <ul>, <li>, <strong>) with minimal inline styles, no \
images, no tracking and no external assets. Escape all dynamic content.
5. Keep a neutral, positive tone without slang or emojis. Output only the JSON object.";

const EMAIL_SCHEMA: &str = r#"{
  "message": {
    "from": "<sender address or empty>",
    "to": "<recipient address or empty>",
    "subject": "<subject>",
    "text": "<plain text body>",
    "html": "<html body>"
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_specs_exist() {
        let prompts = PromptSet::default();

        for spec in [&prompts.intent, &prompts.direct, &prompts.summary, &prompts.email] {
            assert!(!spec.instructions.is_empty());
            assert!(!spec.schema.is_empty());
        }
        assert_eq!(prompts.intent.examples.len(), 2);
        assert_eq!(prompts.summary.examples.len(), 1);
    }

    #[test]
    fn test_example_outputs_are_valid_json() {
        let prompts = PromptSet::default();
        for example in prompts.intent.examples.iter().chain(&prompts.summary.examples) {
            assert!(serde_json::from_str::<serde_json::Value>(&example.output).is_ok());
        }
    }

    #[test]
    fn test_render_embeds_history_and_query() {
        let spec = PromptSet::default().intent;
        let history = vec![
            Message::user("Here are my notes from standup"),
            Message::assistant("Thanks, what would you like me to do with them?"),
        ];

        let prompt = spec.render(&history, "Summarize them please", 10);

        assert!(prompt.contains("User: \"Here are my notes from standup\""));
        assert!(prompt.contains("Bot: \"Thanks, what would you like me to do with them?\""));
        assert!(prompt.ends_with("**User Query:**\nSummarize them please\n\n**Output:**\n"));
        assert!(prompt.contains("**Example 2:**"));
        assert!(!prompt.contains("[object Object]"));
    }

    #[test]
    fn test_render_history_window_keeps_latest_turns() {
        let history: Vec<Message> = (0..5).map(|i| Message::user(format!("turn {i}"))).collect();

        let rendered = render_history(&history, 2);

        assert_eq!(rendered, "User: \"turn 3\"\nUser: \"turn 4\"");
    }

    #[test]
    fn test_render_history_empty() {
        assert_eq!(render_history(&[], 10), "(no previous messages)");
        assert_eq!(
            render_history(&[Message::user("hidden")], 0),
            "(no previous messages)"
        );
    }

    #[test]
    fn test_spec_without_examples_renders_task_only() {
        let spec = PromptSet::default().direct;
        let prompt = spec.render(&[], "What can you do?", 10);

        assert!(!prompt.contains("**Example"));
        assert!(prompt.contains("\"response\""));
        assert!(prompt.contains("What can you do?"));
    }

    #[test]
    fn test_spec_overrides_from_toml() {
        let spec: PromptSpec = toml::from_str(
            r#"
instructions = "Classify the message."
schema = '{"intent": "<label>"}'

[[examples]]
query = "hello"
output = '{"intent": "Misc Mode"}'
"#
        )
        .unwrap();

        assert_eq!(spec.examples.len(), 1);
        assert!(spec.examples[0].history.is_empty());
        assert!(spec.render(&[], "hi", 10).contains("Classify the message."));
    }
}
