use mindmate_chat::error::{ReplyError, SyncError};
use mindmate_chat::{AIMessage, AIService, BackendSync, HttpBackendSync, Message, ReplyService};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn assistant(server: &MockServer, key: Option<&str>) -> AIService {
    AIService::new(
        "test-model".to_string(),
        key.map(String::from),
        Duration::from_secs(5),
    )
    .unwrap()
    .with_endpoint(format!("{}/openai/v1/chat/completions", server.uri()))
    .with_system_prompt("You are a psychologist")
}

fn history() -> Vec<AIMessage> {
    vec![
        AIMessage::new("assistant", "Hi! I'm MindMate. How can I help today?"),
        AIMessage::new("user", "I feel low"),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Assistant replies
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reply_sends_system_prompt_and_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "You are a psychologist"},
                {"role": "assistant", "content": "Hi! I'm MindMate. How can I help today?"},
                {"role": "user", "content": "I feel low"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "I'm sorry to hear that."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = assistant(&server, Some("secret"))
        .generate_response(&history())
        .await
        .unwrap();
    assert_eq!(reply, "I'm sorry to hear that.");
}

#[tokio::test]
async fn non_success_status_is_an_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = assistant(&server, Some("secret"))
        .generate_response(&history())
        .await
        .unwrap_err();
    assert!(matches!(err, ReplyError::Status { status, .. } if status.as_u16() == 429));
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    for body in [json!({"choices": []}), json!({"unexpected": true}), json!({
        "choices": [{"message": {"role": "assistant", "content": "   "}}]
    })] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = assistant(&server, Some("secret"))
            .generate_response(&history())
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::Malformed(_)), "got {err:?}");
    }
}

#[tokio::test]
async fn missing_key_fails_without_calling_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = assistant(&server, Some("  "))
        .generate_response(&history())
        .await
        .unwrap_err();
    assert!(matches!(err, ReplyError::MissingApiKey));
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend sync
// ─────────────────────────────────────────────────────────────────────────────

fn backend(server: &MockServer, token: Option<&str>) -> HttpBackendSync {
    HttpBackendSync::new(
        format!("{}/api/chat/", server.uri()),
        token.map(String::from),
        1,
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn sync_posts_receiver_and_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/"))
        .and(header("authorization", "Bearer access-token"))
        .and(body_json(json!({"receiver": 1, "content": "hello there"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server, Some("access-token"))
        .notify(&Message::user("hello there"))
        .await
        .unwrap();
}

#[tokio::test]
async fn sync_reports_rejections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let err = backend(&server, Some("expired"))
        .notify(&Message::user("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Status { ref body, .. } if body == "bad token"));
}

#[tokio::test]
async fn sync_without_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    backend(&server, None)
        .notify(&Message::user("hello"))
        .await
        .unwrap();
}
