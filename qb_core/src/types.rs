use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Status text attached to every successful envelope.
pub const STATUS_OK: &str = "Prompt received successfully";

/// Status text attached to envelopes built for failed requests.
pub const STATUS_ERROR: &str = "error";

/// The only failure text a user ever sees.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "There was an error processing your request. Please try again.";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System
}

/// One chat turn. Transcripts are ordered and forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into()
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Classified purpose of the current turn.
///
/// `Unrecognized` is never produced by a model on purpose. It stands for any
/// decoded label outside the closed set, including a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Intent {
    #[serde(rename = "Summary Mode")]
    #[strum(serialize = "Summary Mode")]
    Summary,

    #[serde(rename = "Misc Mode")]
    #[strum(serialize = "Misc Mode")]
    Misc,

    #[serde(rename = "Unrecognized")]
    #[strum(serialize = "Unrecognized")]
    Unrecognized
}

impl Intent {
    pub const RECOGNIZED: [Intent; 2] = [Intent::Summary, Intent::Misc];

    pub fn label(self) -> &'static str {
        match self {
            Self::Summary => "Summary Mode",
            Self::Misc => "Misc Mode",
            Self::Unrecognized => "Unrecognized"
        }
    }

    /// Maps a decoded label onto the closed set. Matching ignores case and
    /// surrounding whitespace or quotes; everything else is `Unrecognized`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        Self::RECOGNIZED
            .into_iter()
            .find(|intent| intent.label().eq_ignore_ascii_case(normalized))
            .unwrap_or(Self::Unrecognized)
    }

    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }

    /// Unrecognized labels take the conversational path.
    pub fn mode(self) -> Mode {
        match self {
            Self::Summary => Mode::Summary,
            Self::Misc | Self::Unrecognized => Mode::Direct
        }
    }
}

/// Response generator selected for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Direct,
    Summary
}

/// Structured meeting summary produced in summary mode.
///
/// Models are loose about shapes, so every field accepts a string, a list or
/// null and is normalized on the way in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingSummary {
    #[serde(deserialize_with = "lenient_text")]
    pub date: Option<String>,

    #[serde(deserialize_with = "lenient_list")]
    pub participants: Vec<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub agenda: Option<String>,

    #[serde(deserialize_with = "lenient_list")]
    pub discussion_points: Vec<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub decision_made: Option<String>,

    #[serde(deserialize_with = "lenient_list")]
    pub action_items: Vec<String>,

    #[serde(deserialize_with = "lenient_list")]
    pub next_steps: Vec<String>
}

impl MeetingSummary {
    /// Reads a summary out of a decoded object. Arrays and scalars are not
    /// summaries.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.participants.is_empty()
            && self.agenda.is_none()
            && self.discussion_points.is_empty()
            && self.decision_made.is_none()
            && self.action_items.is_empty()
            && self.next_steps.is_empty()
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(value_to_text).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        other => Some(other.to_string())
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>
{
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(value_to_text).collect(),
        other => value_to_text(other).into_iter().collect()
    };
    Ok(items)
}

/// Body of a summary-mode answer: either a structured record or plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SummaryBody {
    Structured(MeetingSummary),
    Text(String)
}

/// Decoded summary-mode output. Absent fields mean the model output could not
/// be recovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    pub response: Option<SummaryBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>
}

impl SummaryResult {
    pub fn is_degraded(&self) -> bool {
        self.response.is_none()
    }
}

/// Decoded direct-mode output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectResult {
    pub response: Option<String>
}

impl DirectResult {
    pub fn is_degraded(&self) -> bool {
        self.response.is_none()
    }
}

/// The `response` value of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BriefResponse {
    Text(String),
    Summary(MeetingSummary)
}

impl From<SummaryBody> for BriefResponse {
    fn from(body: SummaryBody) -> Self {
        match body {
            SummaryBody::Structured(summary) => Self::Summary(summary),
            SummaryBody::Text(text) => Self::Text(text)
        }
    }
}

/// Normalized result of one routed request.
///
/// `response` is always serialized, as `null` when generation degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope {
    pub status: String,
    pub intent: Intent,
    pub response: Option<BriefResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>
}

impl ResponseEnvelope {
    pub fn direct(intent: Intent, result: DirectResult) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            intent,
            response: result.response.map(BriefResponse::Text),
            action: None
        }
    }

    pub fn summary(intent: Intent, result: SummaryResult) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            intent,
            response: result.response.map(BriefResponse::from),
            action: result.action
        }
    }

    /// Envelope shown to the user when the request could not be served.
    pub fn failure(intent: Intent) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            intent,
            response: Some(BriefResponse::Text(GENERIC_FAILURE_MESSAGE.to_string())),
            action: None
        }
    }
}

/// A query plus the caller-owned conversation history that precedes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<Message>
}

impl BriefRequest {
    pub fn new(query: impl Into<String>, history: Vec<Message>) -> Self {
        Self {
            query: query.into(),
            history
        }
    }
}

/// Outbound email, either drafted by the pipeline or supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>
}
