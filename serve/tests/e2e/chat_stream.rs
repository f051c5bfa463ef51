//! Streaming interception and delta conversion.

use crate::common::{fake_agent, read_tool, settings_with_agent, spawn_server, sse_payloads};
use serde_json::{json, Value};

/// **Scenario**: the upstream emits a readToolCall followed by text; the
/// stream carries exactly the two tool-call chunks and DONE, and none of the
/// trailing text.
#[tokio::test]
async fn tool_call_interception_terminates_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = concat!(
        r#"{"type":"tool_call","subtype":"started","call_id":"c1","tool_call":{"readToolCall":{"args":{"path":"foo.txt"}}}}"#,
        "\n",
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"should not appear"}]}}"#,
    );
    let script = fake_agent(dir.path(), transcript);
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "Read foo.txt"}],
            "tools": read_tool(),
            "stream": true
        }))
        .send()
        .await
        .unwrap();

    let payloads = sse_payloads(resp).await;
    assert_eq!(payloads.last().map(String::as_str), Some("[DONE]"));
    let chunks: Vec<Value> = payloads[..payloads.len() - 1]
        .iter()
        .map(|p| serde_json::from_str(p).unwrap())
        .collect();
    assert_eq!(chunks.len(), 2);

    let first = &chunks[0]["choices"][0];
    assert_eq!(
        first["delta"]["tool_calls"][0]["function"]["name"],
        "read"
    );
    assert_eq!(
        first["delta"]["tool_calls"][0]["function"]["arguments"],
        "{\"path\":\"foo.txt\"}"
    );
    assert!(first["finish_reason"].is_null());
    assert_eq!(chunks[1]["choices"][0]["finish_reason"], "tool_calls");

    for chunk in &chunks {
        let content = chunk["choices"][0]["delta"]["content"].as_str().unwrap_or("");
        assert!(!content.contains("should not appear"));
    }
}

/// **Scenario**: partial text emissions stream through as deltas; the frame
/// sequence parses as chunks then exactly one DONE.
#[tokio::test]
async fn partial_text_streams_as_deltas() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = concat!(
        r#"{"type":"assistant","timestamp_ms":1,"message":{"content":[{"type":"text","text":"Hello"}]}}"#,
        "\n",
        r#"{"type":"assistant","timestamp_ms":2,"message":{"content":[{"type":"text","text":" world"}]}}"#,
        "\n",
        r#"{"type":"result","subtype":"success"}"#,
    );
    let script = fake_agent(dir.path(), transcript);
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/chat/completions"))
        .json(&json!({
            "model": "cursor/auto",
            "messages": [{"role": "user", "content": "say hello"}],
            "stream": true
        }))
        .send()
        .await
        .unwrap();

    let payloads = sse_payloads(resp).await;
    let done_count = payloads.iter().filter(|p| *p == "[DONE]").count();
    assert_eq!(done_count, 1);
    assert_eq!(payloads.last().map(String::as_str), Some("[DONE]"));

    let mut text = String::new();
    let mut finish = None;
    for payload in &payloads[..payloads.len() - 1] {
        let chunk: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(chunk["object"], "chat.completion.chunk");
        if let Some(delta) = chunk["choices"][0]["delta"]["content"].as_str() {
            text.push_str(delta);
        }
        if let Some(reason) = chunk["choices"][0]["finish_reason"].as_str() {
            finish = Some(reason.to_string());
        }
    }
    assert_eq!(text, "Hello world");
    assert_eq!(finish.as_deref(), Some("stop"));
}
