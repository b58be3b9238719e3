// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box invocation scenarios driven entirely over real sockets: a
//! `Gateway` bound to a real TCP port, invoking a real child process (the
//! `fake_worker` binary built alongside this crate) over a real Unix
//! socket.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fxemu_gateway::{Gateway, GatewayConfig};

/// Resolves the `fake_worker` binary built by this crate's own `[[bin]]`
/// (actually an auto-discovered `src/bin/` target). Falls back to
/// `current_exe`'s directory when `CARGO_MANIFEST_DIR` points at a stale
/// path (e.g. a removed worktree sharing a `target/` directory).
fn fake_worker_path() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let name = if cfg!(windows) { "fake_worker.exe" } else { "fake_worker" };

    let standard = manifest_dir.join("../../target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("local addr")
        .port()
}

async fn running_gateway() -> (Gateway, u16) {
    let port = free_port();
    let config = GatewayConfig {
        host: "127.0.0.1".to_string(),
        port,
        project_id: "demo-project".to_string(),
        functions_dir: std::env::temp_dir(),
        node_binary: fake_worker_path(),
        runtime_entry_path: PathBuf::new(),
        sibling_port_directory: HashMap::new(),
        disabled_features: Vec::new(),
    };
    let gateway = Gateway::new(config);
    gateway.start().await.expect("gateway should bind its listener");
    (gateway, port)
}

#[tokio::test]
async fn s1_echo_round_trip_over_the_workers_unix_socket() {
    let (gateway, port) = running_gateway().await;

    let url = format!("http://127.0.0.1:{port}/demo-project/us-central1/echo?x=1");
    let response = tokio::time::timeout(
        Duration::from_secs(5),
        reqwest::Client::new().post(&url).body("payload-bytes").send(),
    )
    .await
    .expect("request should not time out")
    .expect("request should succeed");

    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get("x-echo-path").map(|v| v.to_str().unwrap()),
        Some("/demo-project/us-central1/echo?x=1")
    );
    let body = response.text().await.expect("body");
    assert_eq!(body, "payload-bytes");

    gateway.stop();
}

#[tokio::test]
async fn s2_event_trigger_acks_after_worker_exit() {
    let (gateway, port) = running_gateway().await;

    let url = format!("http://127.0.0.1:{port}/demo-project/us-central1/onWrite");
    let response = tokio::time::timeout(
        Duration::from_secs(5),
        reqwest::Client::new().post(&url).json(&serde_json::json!({"before": {}, "after": {}})).send(),
    )
    .await
    .expect("request should not time out")
    .expect("request should succeed");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let payload: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(payload, serde_json::json!({ "status": "acknowledged" }));

    gateway.stop();
}

#[tokio::test]
async fn s6_unknown_trigger_name_is_a_server_error() {
    let (gateway, port) = running_gateway().await;

    let url = format!("http://127.0.0.1:{port}/demo-project/us-central1/doesNotExist");
    let response = tokio::time::timeout(Duration::from_secs(5), reqwest::Client::new().post(&url).send())
        .await
        .expect("request should not time out")
        .expect("request should succeed");

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

    gateway.stop();
}
