//! Malformed requests are an HTTP 500 with a JSON error field.

use crate::common::spawn_server;
use env_config::Settings;
use serde_json::Value;

#[tokio::test]
async fn malformed_body_is_a_500_json_error() {
    let (base, _server) = spawn_server(Settings::default()).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("invalid request body"));
}
