//! SendGrid v3 mail transport.

use async_trait::async_trait;
use errors::MailError;
use qb_core::{MailMessage, MailTransport};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1]
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime: &'static str,
    value: &'a str
}

pub struct SendGridTransport {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client
}

impl SendGridTransport {
    pub fn new(api_key: Option<String>, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client: reqwest::Client::new()
        }
    }

    pub fn from_config(config: &config::MailConfig) -> Self {
        Self::new(config.sendgrid_api_key.clone(), &config.base_url)
    }
}

/// Checks the fields every provider needs before anything goes out.
pub fn check_message(message: &MailMessage) -> Result<(), MailError> {
    let missing = [
        ("to", message.to.trim().is_empty()),
        ("from", message.from.trim().is_empty()),
        ("subject", message.subject.trim().is_empty()),
    ]
    .into_iter()
    .find(|(_, empty)| *empty);

    if let Some((field, _)) = missing {
        return Err(MailError::InvalidMessage {
            reason: format!("'{field}' is required")
        });
    }

    let has_body = [&message.text, &message.html]
        .into_iter()
        .flatten()
        .any(|body| !body.trim().is_empty());
    if !has_body {
        return Err(MailError::InvalidMessage {
            reason: "either 'text' or 'html' content is required".to_string()
        });
    }
    Ok(())
}

#[async_trait]
impl MailTransport for SendGridTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(MailError::NotConfigured {
                reason: "SendGrid API key is missing".to_string()
            });
        };
        check_message(message)?;

        // SendGrid requires text/plain ahead of text/html.
        let mut content = Vec::with_capacity(2);
        if let Some(text) = message.text.as_deref().filter(|t| !t.trim().is_empty()) {
            content.push(Content {
                mime: "text/plain",
                value: text
            });
        }
        if let Some(html) = message.html.as_deref().filter(|h| !h.trim().is_empty()) {
            content.push(Content {
                mime: "text/html",
                value: html
            });
        }

        let request = SendRequest {
            personalizations: [Personalization {
                to: [Address { email: &message.to }]
            }],
            from: Address {
                email: &message.from
            },
            subject: &message.subject,
            content
        };

        let url = format!("{}/v3/mail/send", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::Transport {
                reason: e.to_string()
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "SendGrid rejected the message");
            return Err(MailError::Rejected { status, body });
        }

        info!(to = %message.to, "Email sent");
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
