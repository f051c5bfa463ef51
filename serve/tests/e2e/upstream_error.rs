//! Upstream failures render as assistant content, never as HTTP errors.

use crate::common::{failing_agent, settings_with_agent, spawn_server};
use serde_json::{json, Value};

#[tokio::test]
async fn usage_limit_failure_is_a_200_completion() {
    let dir = tempfile::tempdir().unwrap();
    let script = failing_agent(dir.path(), "You've hit your usage limit");
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "hello"}],
            "stream": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let content = body["choices"][0]["message"]["content"].as_str().unwrap();
    assert!(
        content.starts_with("cursor-acp error: You've hit your Cursor usage limit"),
        "unexpected content: {content}"
    );
}

#[tokio::test]
async fn streaming_failure_still_ends_with_done() {
    let dir = tempfile::tempdir().unwrap();
    let script = failing_agent(dir.path(), "Error: not logged in");
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "hello"}],
            "stream": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = resp.text().await.unwrap();
    let payloads: Vec<&str> = body
        .lines()
        .filter_map(|l| l.strip_prefix("data: "))
        .collect();
    assert_eq!(payloads.last().copied(), Some("[DONE]"));
    let joined = payloads.join("\n");
    assert!(joined.contains("cursor-acp error: You are not logged in to Cursor."));
}
