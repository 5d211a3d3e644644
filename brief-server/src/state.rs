//! Application state for the QuickBrief server.

use std::sync::Arc;

use adapters::{ChatCompletionsClient, SendGridTransport};
use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use pipeline::{
    ChatResponder, EmailDrafter, Orchestrator, PipelineSettings, Recipients, RetryingLlm
};
use qb_core::{LlmClient, MailTransport};

use crate::error::{AppError, Result};

/// Shared application state for Axum handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<RetryingLlm<dyn LlmClient>>,
    pub orchestrator: Orchestrator<dyn LlmClient>,
    pub chat: ChatResponder<dyn LlmClient>,
    pub drafter: EmailDrafter<dyn LlmClient>,
    pub mail: Arc<dyn MailTransport>,
    /// Present when the Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>
}

impl AppState {
    /// Wires the pipeline around the given collaborators.
    pub fn new(
        config: Config,
        client: Arc<dyn LlmClient>,
        mail: Arc<dyn MailTransport>,
        metrics: Option<PrometheusHandle>
    ) -> Self {
        let settings = PipelineSettings::from_config(&config);
        let llm = Arc::new(RetryingLlm::new(
            client,
            settings.system_prompt.clone(),
            settings.retry
        ));

        Self {
            orchestrator: Orchestrator::new(llm.clone(), &settings),
            chat: ChatResponder::new(llm.clone()),
            drafter: EmailDrafter::new(llm.clone(), settings.prompts.email.clone()),
            llm,
            mail,
            metrics,
            config: Arc::new(config)
        }
    }

    /// Builds the provider adapters from configuration.
    pub fn from_config(config: Config, metrics: Option<PrometheusHandle>) -> Result<Self> {
        let client = ChatCompletionsClient::from_config(&config.llm).map_err(|e| {
            AppError::Configuration {
                message: e.to_string()
            }
        })?;
        let mail = SendGridTransport::from_config(&config.mail);

        if !client.is_configured() {
            tracing::warn!("GROQ_API_KEY is not set, model calls will fail");
        }
        if !mail.is_configured() {
            tracing::warn!("SENDGRID_API_KEY is not set, email sending is disabled");
        }

        Ok(Self::new(config, Arc::new(client), Arc::new(mail), metrics))
    }

    /// Fills in configured default addresses where the caller left them out.
    pub fn recipients(&self, to: Option<String>, from: Option<String>) -> Recipients {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Recipients {
            to: non_empty(to).or_else(|| self.config.mail.default_to.clone()),
            from: non_empty(from).or_else(|| self.config.mail.default_from.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::{RecordingMailTransport, ScriptedLlmClient};

    fn state(config: Config) -> AppState {
        AppState::new(
            config,
            Arc::new(ScriptedLlmClient::default()),
            Arc::new(RecordingMailTransport::new()),
            None
        )
    }

    #[test]
    fn test_recipients_fall_back_to_defaults() {
        let mut config = Config::default();
        config.mail.default_from = Some("notes@example.com".to_string());
        config.mail.default_to = Some("team@example.com".to_string());
        let state = state(config);

        let recipients = state.recipients(Some("  ".to_string()), None);
        assert_eq!(recipients.to.as_deref(), Some("team@example.com"));
        assert_eq!(recipients.from.as_deref(), Some("notes@example.com"));

        let recipients = state.recipients(Some("cto@example.com".to_string()), None);
        assert_eq!(recipients.to.as_deref(), Some("cto@example.com"));
    }

    #[test]
    fn test_from_config_without_keys() {
        let state = AppState::from_config(Config::default(), None).unwrap();
        assert!(!state.llm.is_configured());
        assert!(!state.mail.is_configured());
    }
}
