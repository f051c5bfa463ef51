use crate::common::spawn_server;
use env_config::Settings;

#[tokio::test]
async fn models_list_on_both_paths() {
    let (base, _server) = spawn_server(Settings::default()).await;
    for path in ["/models", "/v1/models"] {
        let body: serde_json::Value = reqwest::get(format!("{base}{path}"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["object"], "list", "{path}");
        let ids: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"auto"), "{path}: {ids:?}");
        assert_eq!(body["data"][0]["object"], "model");
        assert_eq!(body["data"][0]["owned_by"], "cursor");
    }
}
