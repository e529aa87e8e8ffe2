//! HTTP contract tests for `HttpBackend`.
//!
//! These tests pin the wire format of the three endpoints: request bodies,
//! paths under the API prefix, and how each response shape is classified.

use std::time::Duration;

use medchat::backend::{AssistantBackend, BackendError, ChatReply, HttpBackend};
use medchat::config::BackendConfig;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer, api_prefix: &str) -> HttpBackend {
    HttpBackend::from_config(&BackendConfig {
        base_url: server.uri(),
        api_prefix: api_prefix.into(),
        timeout_secs: 5,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// /chat
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_posts_message_and_reads_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({ "message": "Can I take ibuprofen?" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "response": "Take it with food." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend_for(&server, "/api")
        .chat("Can I take ibuprofen?")
        .await
        .unwrap();
    assert_eq!(reply, ChatReply::Response("Take it with food.".into()));
}

#[tokio::test]
async fn chat_error_body_is_reported_even_on_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "error": "rate limited" })))
        .mount(&server)
        .await;

    let reply = backend_for(&server, "/api").chat("hi").await.unwrap();
    assert_eq!(reply, ChatReply::Error("rate limited".into()));
}

#[tokio::test]
async fn chat_without_fields_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let reply = backend_for(&server, "/api").chat("hi").await.unwrap();
    assert_eq!(reply, ChatReply::Empty);
}

#[tokio::test]
async fn chat_html_error_page_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server, "/api").chat("hi").await.unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_prefix_uses_bare_paths() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend_for(&server, "").chat("hi").await.unwrap();
    assert_eq!(reply, ChatReply::Response("ok".into()));
}

// ────────────────────────────────────────────────────────────────────────────
// /speak
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn speak_returns_audio_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/speak"))
        .and(body_json(json!({ "text": "Drink water." })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x49, 0x44, 0x33, 0x04]))
        .expect(1)
        .mount(&server)
        .await;

    let audio = backend_for(&server, "/api").speak("Drink water.").await.unwrap();
    assert_eq!(audio, vec![0x49, 0x44, 0x33, 0x04]);
}

#[tokio::test]
async fn speak_non_ok_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/speak"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend_for(&server, "/api").speak("x").await.unwrap_err();
    assert!(matches!(err, BackendError::Status(503)), "got {err:?}");
}

// ────────────────────────────────────────────────────────────────────────────
// /voice
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn voice_uploads_multipart_audio_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/voice"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains(
            "name=\"audio\"; filename=\"recording.wav\"",
        ))
        .and(body_string_contains("audio/wav"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "I have a headache" })))
        .expect(1)
        .mount(&server)
        .await;

    let text = backend_for(&server, "/api")
        .voice(b"RIFF-test-recording".to_vec())
        .await
        .unwrap();
    assert_eq!(text, "I have a headache");
}

#[tokio::test]
async fn voice_without_text_is_empty_string() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/voice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let text = backend_for(&server, "/api").voice(b"RIFF".to_vec()).await.unwrap();
    assert_eq!(text, "");
}

// ────────────────────────────────────────────────────────────────────────────
// Connectivity
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::from_config(&BackendConfig {
        base_url: server.uri(),
        api_prefix: "/api".into(),
        timeout_secs: 1,
    });
    let err = backend.chat("hi").await.unwrap_err();
    assert!(matches!(err, BackendError::Timeout), "got {err:?}");
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn unreachable_backend_is_request_error() {
    let backend = HttpBackend::from_config(&BackendConfig {
        base_url: "http://127.0.0.1:9".into(),
        api_prefix: "/api".into(),
        timeout_secs: 5,
    });
    let err = backend.chat("hi").await.unwrap_err();
    assert!(err.is_connectivity(), "got {err:?}");
}
