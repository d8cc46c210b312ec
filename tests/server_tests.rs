//! Real-socket smoke test: serves the app on an ephemeral port with peer
//! address info, exactly as `main` does, and talks to it with `reqwest`.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use command_relay::api::build_app;
use command_relay::app_state::AppState;
use command_relay::config::RelayConfig;
use command_relay::service::RelayService;
use serde_json::{Value, json};

async fn spawn_server(config: RelayConfig) -> SocketAddr {
    let service = Arc::new(RelayService::new(&config));
    let app = build_app(AppState::new(&config, service));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

#[tokio::test]
async fn test_submit_and_inspect_over_tcp() {
    let addr = spawn_server(RelayConfig::default().with_admin_secret("k")).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/action"))
        .json(&json!({ "action": "S" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("ratelimit"));

    let response = client
        .post(format!("http://{addr}/action"))
        .json(&json!({ "action": "Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["reason"], "invalid");

    let info: Value = client
        .get(format!("http://{addr}/info"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["actions"], json!(["S"]));
}

#[tokio::test]
async fn test_rate_limit_is_per_peer_over_tcp() {
    let config = RelayConfig {
        rate_limit_requests: 1,
        rate_limit_window: Duration::from_secs(60),
        ..RelayConfig::default()
    };
    let addr = spawn_server(config).await;
    let client = reqwest::Client::new();

    let first = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);

    let second = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));
}
