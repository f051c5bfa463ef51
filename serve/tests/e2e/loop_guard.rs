//! Loop-guard termination over request history.

use crate::common::{edit_tool_def, fake_agent, settings_with_agent, spawn_server};
use serde_json::{json, Value};

#[tokio::test]
async fn repeated_schema_invalid_edits_terminate_the_turn() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = r#"{"type":"tool_call","subtype":"started","call_id":"c9","tool_call":{"editToolCall":{"args":{"path":"F.md","content":"x"}}}}"#;
    let script = fake_agent(dir.path(), transcript);
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let mut messages = vec![json!({"role": "user", "content": "fix F.md"})];
    for idx in 0..3 {
        let id = format!("c{idx}");
        messages.push(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": id,
                "type": "function",
                "function": {
                    "name": "edit",
                    "arguments": "{\"path\":\"F.md\",\"content\":\"x\"}"
                }
            }]
        }));
        messages.push(json!({
            "role": "tool",
            "tool_call_id": id,
            "content": "Invalid arguments: missing required field path"
        }));
    }

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&json!({
            "model": "auto",
            "messages": messages,
            "tools": [edit_tool_def()],
            "stream": false
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let content = body["choices"][0]["message"]["content"].as_str().unwrap();
    assert!(
        content.starts_with("Tool loop guard stopped repeated schema-invalid calls to \"edit\""),
        "unexpected content: {content}"
    );
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
}
