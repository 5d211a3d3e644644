use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use brief_server::{AppState, create_router};
use config::Config;
use errors::{LlmError, MailError};
use qb_core::{LlmClient, MailTransport};
use serde_json::{Value, json};
use testing::{
    FailingLlmClient, RecordingMailTransport, SALES_TRANSCRIPT, ScriptedLlmClient,
    classification_reply, direct_reply, sales_summary_reply
};
use tower::ServiceExt;

fn fast_config() -> Config {
    let mut config = Config::default();
    config.retry.delay_ms = 0;
    config.mail.default_from = Some("notes@example.com".to_string());
    config
}

fn router(client: Arc<dyn LlmClient>, mail: Arc<dyn MailTransport>) -> axum::Router {
    create_router(Arc::new(AppState::new(fast_config(), client, mail, None)))
}

async fn post(router: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health_reports_configuration() {
    let router = router(
        Arc::new(ScriptedLlmClient::default().unconfigured()),
        Arc::new(RecordingMailTransport::new())
    );

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm_configured"], false);
    assert_eq!(body["mail_configured"], true);
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let router = router(
        Arc::new(ScriptedLlmClient::default()),
        Arc::new(RecordingMailTransport::new())
    );

    let response = router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_brief_direct_envelope() {
    let client = Arc::new(ScriptedLlmClient::with_replies([
        classification_reply("Misc Mode"),
        direct_reply("Glad I could help!"),
    ]));
    let router = router(client.clone(), Arc::new(RecordingMailTransport::new()));

    let (status, body) = post(
        router,
        "/v1/brief",
        json!({
            "query": "thanks so much!",
            "messages": [
                { "role": "user", "content": "Can you help me?" },
                { "role": "assistant", "content": "Of course." },
                { "role": "user", "content": "thanks so much!" }
            ]
        })
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Prompt received successfully");
    assert_eq!(body["intent"], "Misc Mode");
    assert_eq!(body["response"], "Glad I could help!");

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].history.len(), 2);
}

#[tokio::test]
async fn test_brief_summary_envelope() {
    let client = Arc::new(ScriptedLlmClient::with_replies([
        classification_reply("Summary Mode"),
        sales_summary_reply(),
    ]));
    let router = router(client, Arc::new(RecordingMailTransport::new()));

    let (status, body) = post(router, "/v1/brief", json!({ "query": SALES_TRANSCRIPT })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "Summary Mode");
    assert!(!body["response"]["discussion_points"].as_array().unwrap().is_empty());
    assert_eq!(body["action"], "Alex to send the proposal by Friday");
}

#[tokio::test]
async fn test_brief_provider_outage_returns_envelope() {
    let router = router(
        Arc::new(FailingLlmClient::unavailable()),
        Arc::new(RecordingMailTransport::new())
    );

    let (status, body) = post(router, "/v1/brief", json!({ "query": "hello" })).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert_eq!(body["intent"], "Unrecognized");
    assert_eq!(
        body["response"],
        "There was an error processing your request. Please try again."
    );
    assert_eq!(body["code"], "PROVIDER_UNAVAILABLE");
}

#[tokio::test]
async fn test_brief_missing_query() {
    let router = router(
        Arc::new(ScriptedLlmClient::default()),
        Arc::new(RecordingMailTransport::new())
    );

    let (status, body) = post(router, "/v1/brief", json!({ "messages": [] })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert!(body.get("response").is_some());
}

#[tokio::test]
async fn test_brief_without_provider_key() {
    let router = router(
        Arc::new(FailingLlmClient::new(LlmError::NotConfigured {
            reason: "GROQ_API_KEY is not set".to_string()
        })),
        Arc::new(RecordingMailTransport::new())
    );

    let (status, body) = post(router, "/v1/brief", json!({ "query": "hello" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_generate_returns_transcript() {
    let router = router(
        Arc::new(ScriptedLlmClient::with_replies(["Hi! What can I do for you?"])),
        Arc::new(RecordingMailTransport::new())
    );

    let (status, body) = post(
        router,
        "/v1/generate",
        json!({
            "prompt": "Hello",
            "messages": [{ "role": "user", "content": "Are you there?" }, { "role": "assistant", "content": "Yes." }]
        })
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text"], "Hi! What can I do for you?");
    assert_eq!(body["data"]["conversation_length"], 4);
    assert_eq!(body["data"]["messages"][2]["content"], "Hello");
    assert_eq!(body["data"]["messages"][3]["role"], "assistant");
}

#[tokio::test]
async fn test_draft_does_not_send() {
    let mail = Arc::new(RecordingMailTransport::new());
    let router = router(
        Arc::new(ScriptedLlmClient::with_replies(["not an email"])),
        mail.clone()
    );

    let (status, body) = post(
        router,
        "/v1/mail/draft",
        json!({
            "summary": { "agenda": "Roadmap", "discussion_points": ["Ship v2 in May"] },
            "to": "team@example.com"
        })
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["to"], "team@example.com");
    assert_eq!(body["draft"]["from"], "notes@example.com");
    assert_eq!(body["draft"]["subject"], "Meeting summary: Roadmap");
    assert!(mail.sent().is_empty());
}

#[tokio::test]
async fn test_send_uses_default_sender() {
    let mail = Arc::new(RecordingMailTransport::new());
    let router = router(Arc::new(ScriptedLlmClient::default()), mail.clone());

    let (status, body) = post(
        router,
        "/v1/mail/send",
        json!({
            "to": "team@example.com",
            "subject": "Roadmap recap",
            "text": "Ship v2 in May."
        })
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let sent = mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "notes@example.com");
}

#[tokio::test]
async fn test_send_failure_is_server_error() {
    let mail = Arc::new(RecordingMailTransport::rejecting(MailError::Rejected {
        status: 403,
        body: "forbidden".to_string()
    }));
    let router = router(Arc::new(ScriptedLlmClient::default()), mail);

    let (status, body) = post(
        router,
        "/v1/mail/send",
        json!({
            "to": "team@example.com",
            "from": "notes@example.com",
            "subject": "Recap",
            "html": "<p>Recap</p>"
        })
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to send email");
}
