//! Shared helpers for e2e tests.

use env_config::Settings;
use std::path::Path;
use tokio::net::TcpListener;

/// Binds a random port and serves on it. Returns the base URL and the server
/// task handle (aborted on drop at test end).
pub async fn spawn_server(
    settings: Settings,
) -> (
    String,
    tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(serve::run_serve_on_listener(listener, settings));
    (format!("http://{addr}"), handle)
}

/// Writes an executable fake agent that drains stdin and prints `transcript`
/// (line-delimited JSON) to stdout. Returns the script path.
pub fn fake_agent(dir: &Path, transcript: &str) -> String {
    write_script(
        dir,
        &format!("#!/bin/sh\ncat >/dev/null\ncat <<'EOF'\n{transcript}\nEOF\n"),
    )
}

/// Writes an executable fake agent that fails with `stderr_line` on stderr.
pub fn failing_agent(dir: &Path, stderr_line: &str) -> String {
    write_script(
        dir,
        &format!("#!/bin/sh\ncat >/dev/null\necho \"{stderr_line}\" >&2\nexit 1\n"),
    )
}

fn write_script(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("fake-agent.sh");
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// Settings wired to the given fake agent.
pub fn settings_with_agent(script: &str) -> Settings {
    Settings {
        agent_command: Some(script.to_string()),
        ..Default::default()
    }
}

/// Collects the `data:` payloads of an SSE response body.
pub async fn sse_payloads(resp: reqwest::Response) -> Vec<String> {
    assert!(resp.status().is_success(), "status {}", resp.status());
    let body = resp.text().await.unwrap();
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(str::to_string)
        .collect()
}

/// The standard read tool with a one-field schema.
pub fn read_tool() -> serde_json::Value {
    serde_json::json!([{
        "type": "function",
        "function": {
            "name": "read",
            "parameters": {
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"]
            }
        }
    }])
}

pub fn edit_tool_def() -> serde_json::Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": "edit",
            "parameters": {
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "old_string": {"type": "string"},
                    "new_string": {"type": "string"}
                },
                "required": ["path", "old_string", "new_string"]
            }
        }
    })
}

pub fn write_tool_def() -> serde_json::Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": "write",
            "parameters": {
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "content": {"type": "string"}
                },
                "required": ["path", "content"]
            }
        }
    })
}
