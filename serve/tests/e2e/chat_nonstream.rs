//! Non-streaming responses.

use crate::common::{fake_agent, read_tool, settings_with_agent, spawn_server};
use serde_json::{json, Value};

#[tokio::test]
async fn tool_call_wins_over_text() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = concat!(
        r#"{"type":"tool_call","subtype":"started","call_id":"c1","tool_call":{"readToolCall":{"args":{"path":"foo.txt"}}}}"#,
        "\n",
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"ignored"}]}}"#,
    );
    let script = fake_agent(dir.path(), transcript);
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "Read foo.txt"}],
            "tools": read_tool(),
            "stream": false
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["object"], "chat.completion");
    let message = &body["choices"][0]["message"];
    assert!(message["content"].is_null());
    assert_eq!(message["tool_calls"][0]["function"]["name"], "read");
    assert_eq!(body["choices"][0]["finish_reason"], "tool_calls");
}

#[tokio::test]
async fn text_and_reasoning_are_collected() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = concat!(
        r#"{"type":"thinking","subtype":"delta","text":"pondering"}"#,
        "\n",
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"The answer is 4."}]}}"#,
        "\n",
        r#"{"type":"result","subtype":"success"}"#,
    );
    let script = fake_agent(dir.path(), transcript);
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/chat/completions"))
        .json(&json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "2+2?"}],
            "stream": false
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let message = &body["choices"][0]["message"];
    assert_eq!(message["content"], "The answer is 4.");
    assert_eq!(message["reasoning_content"], "pondering");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
}
