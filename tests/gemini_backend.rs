//! `GeminiBackend` against a local mock upstream.

mod common;

use common::start_mock_upstream;
use quill_gateway::backend::{BackendError, GeminiBackend, TextBackend};
use quill_gateway::config::BackendConfig;

fn backend_for(addr: std::net::SocketAddr) -> GeminiBackend {
    let config = BackendConfig {
        base_url: format!("http://{}", addr),
        api_key: "test-key".to_string(),
        max_output_tokens: 64,
        ..BackendConfig::default()
    };
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    GeminiBackend::new(client, &config).unwrap()
}

#[tokio::test]
async fn test_success_returns_every_text_part() {
    let body = serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "first"}, {"text": "second"}]},
            "finishReason": "STOP"
        }]
    })
    .to_string();
    let (addr, seen) = start_mock_upstream(200, body).await;

    let fragments = backend_for(addr)
        .generate("gemini-1.5-flash", "Write a haiku")
        .await
        .unwrap();
    assert_eq!(fragments, vec!["first".to_string(), "second".to_string()]);

    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.starts_with("POST /v1beta/models/gemini-1.5-flash:generateContent HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("x-goog-api-key: test-key"));

    let (_, json) = request.split_once("\r\n\r\n").unwrap();
    let sent: serde_json::Value = serde_json::from_str(json).unwrap();
    assert_eq!(sent["contents"][0]["parts"][0]["text"], "Write a haiku");
    assert_eq!(sent["generationConfig"]["maxOutputTokens"], 64);
}

#[tokio::test]
async fn test_error_status_keeps_truncated_body() {
    let body = format!("x{}", "é".repeat(400));
    let (addr, _) = start_mock_upstream(400, body).await;

    let err = backend_for(addr).generate("gemini-pro", "prompt").await.unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body.len(), 511);
            assert!(body.starts_with("xé"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (addr, _) = start_mock_upstream(200, "{\"candidates\": [".to_string()).await;

    let err = backend_for(addr).generate("gemini-pro", "prompt").await.unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_blocked_prompt_yields_no_fragments() {
    let body = serde_json::json!({ "promptFeedback": {"blockReason": "SAFETY"} }).to_string();
    let (addr, _) = start_mock_upstream(200, body).await;

    let fragments = backend_for(addr).generate("gemini-pro", "prompt").await.unwrap();
    assert!(fragments.is_empty());
}
