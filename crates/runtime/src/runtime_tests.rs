// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::time::Duration;

use fxemu_core::RuntimeBundle;
use tempfile::NamedTempFile;

use super::*;

/// Writes a `sh` script and returns options that run it as `sh <script> $1 $2`,
/// matching how `Runtime::spawn` always invokes `node_binary runtime_entry_path
/// bundle_json triggers_json`. Mirrors the worker entry point without needing
/// a real node runtime in test environments.
fn script_opts(body: &str) -> (NamedTempFile, SpawnOptions) {
    let mut file = NamedTempFile::new().expect("create temp script");
    write!(file, "{body}").expect("write script");
    let opts = SpawnOptions {
        node_binary: "sh".into(),
        runtime_entry_path: file.path().to_path_buf(),
        cached_triggers: None,
        extra_env: Vec::new(),
        log_channel_capacity: 64,
    };
    (file, opts)
}

fn diagnostic_bundle() -> RuntimeBundle {
    RuntimeBundle::diagnostic("demo-project", std::env::temp_dir(), Default::default())
}

#[tokio::test]
async fn ready_resolves_from_ready_record() {
    let (_script, opts) = script_opts(
        r#"printf '{"level":"SYSTEM","type":"runtime-status","text":"ready","data":{"socketPath":"/tmp/demo.sock"}}\n'
sleep 0.2
"#,
    );
    let mut runtime = Runtime::spawn(&diagnostic_bundle(), &opts).await.unwrap();
    let socket_path = runtime.ready().await.unwrap();
    assert_eq!(socket_path, "/tmp/demo.sock");
}

#[tokio::test]
async fn exit_before_ready_surfaces_error() {
    let (_script, opts) = script_opts("exit 0\n");
    let mut runtime = Runtime::spawn(&diagnostic_bundle(), &opts).await.unwrap();
    let result = runtime.ready().await;
    assert!(matches!(result, Err(RuntimeError::WorkerExitedBeforeReady)));
}

#[tokio::test]
async fn fatal_log_triggers_kill_and_synthetic_killed_record() {
    let (_script, opts) = script_opts(
        r#"printf '{"level":"FATAL","type":"log","text":"boom","data":{}}\n'
sleep 30
"#,
    );
    let mut runtime = Runtime::spawn(&diagnostic_bundle(), &opts).await.unwrap();
    let mut sub = runtime.subscribe();

    let killed = crate::wait_for_log(&mut sub, fxemu_core::LogLevel::System, "runtime-status", |r| {
        r.text == "killed"
    })
    .await
    .unwrap();
    assert!(killed.is_system("runtime-status"));

    let status = tokio::time::timeout(Duration::from_secs(5), runtime.exit())
        .await
        .expect("worker should exit promptly after being killed")
        .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn kill_is_idempotent_after_natural_exit() {
    let (_script, opts) = script_opts("exit 0\n");
    let mut runtime = Runtime::spawn(&diagnostic_bundle(), &opts).await.unwrap();
    let _ = runtime.exit().await;
    runtime.kill(nix::sys::signal::Signal::SIGTERM).unwrap();
    runtime.kill(nix::sys::signal::Signal::SIGTERM).unwrap();
}

#[tokio::test]
async fn log_ordering_preserved_within_one_pipe() {
    let (_script, opts) = script_opts(
        r#"printf '{"level":"INFO","type":"log","text":"one","data":{}}\n'
printf '{"level":"INFO","type":"log","text":"two","data":{}}\n'
printf '{"level":"INFO","type":"log","text":"three","data":{}}\n'
"#,
    );
    let runtime = Runtime::spawn(&diagnostic_bundle(), &opts).await.unwrap();
    let mut sub = runtime.subscribe();

    let mut texts = Vec::new();
    while texts.len() < 3 {
        let record = sub.recv().await.unwrap();
        if record.r#type == "log" {
            texts.push(record.text);
        }
    }
    assert_eq!(texts, vec!["one", "two", "three"]);
}
