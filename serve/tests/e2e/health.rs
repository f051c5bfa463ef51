use crate::common::spawn_server;
use env_config::Settings;

#[tokio::test]
async fn health_reports_ok() {
    let (base, _server) = spawn_server(Settings::default()).await;
    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert!(body["version"].is_string());
}
