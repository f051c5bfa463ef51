//! Full-file edit → write reroute.

use crate::common::{edit_tool_def, fake_agent, settings_with_agent, spawn_server, write_tool_def};
use serde_json::{json, Value};

#[tokio::test]
async fn full_file_edit_is_rerouted_to_write() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = r#"{"type":"tool_call","subtype":"started","call_id":"c1","tool_call":{"editToolCall":{"args":{"path":"TODO.md","content":"hello"}}}}"#;
    let script = fake_agent(dir.path(), transcript);
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "write the todo file"}],
            "tools": [edit_tool_def(), write_tool_def()],
            "stream": false
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let call = &body["choices"][0]["message"]["tool_calls"][0];
    assert_eq!(call["function"]["name"], "write");
    let args: Value =
        serde_json::from_str(call["function"]["arguments"].as_str().unwrap()).unwrap();
    assert_eq!(args, json!({"path": "TODO.md", "content": "hello"}));
    assert_eq!(body["choices"][0]["finish_reason"], "tool_calls");
}

#[tokio::test]
async fn stream_content_edit_stays_edit_without_write_schema() {
    let dir = tempfile::tempdir().unwrap();
    let transcript = r##"{"type":"tool_call","subtype":"started","call_id":"c1","tool_call":{"editToolCall":{"args":{"path":"PLAN.md","streamContent":["# Plan\n",{"text":"- Step 1\n"},{"text":"- Step 2\n"}]}}}}"##;
    let script = fake_agent(dir.path(), transcript);
    let (base, _server) = spawn_server(settings_with_agent(&script)).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&json!({
            "model": "auto",
            "messages": [{"role": "user", "content": "plan it"}],
            "tools": [edit_tool_def()],
            "stream": false
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let call = &body["choices"][0]["message"]["tool_calls"][0];
    assert_eq!(call["function"]["name"], "edit");
    let args: Value =
        serde_json::from_str(call["function"]["arguments"].as_str().unwrap()).unwrap();
    assert_eq!(args["new_string"], "# Plan\n- Step 1\n- Step 2\n");
    assert_eq!(args["old_string"], "");
}
