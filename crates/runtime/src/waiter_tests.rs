// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fxemu_core::{LogLevel, LogRecord};
use tokio::sync::broadcast;

use super::*;

fn record(level: LogLevel, r#type: &str, text: &str) -> LogRecord {
    LogRecord {
        level,
        r#type: r#type.to_string(),
        text: text.to_string(),
        data: serde_json::json!({}),
    }
}

#[tokio::test]
async fn resolves_on_first_match() {
    let (tx, mut rx) = broadcast::channel(16);
    tx.send(record(LogLevel::Info, "log", "noise")).unwrap();
    tx.send(record(LogLevel::System, "triggers-parsed", "")).unwrap();

    let found = wait_for_log(&mut rx, LogLevel::System, "triggers-parsed", |_| true)
        .await
        .unwrap();
    assert_eq!(found.r#type, "triggers-parsed");
}

#[tokio::test]
async fn predicate_filters_same_level_and_type() {
    let (tx, mut rx) = broadcast::channel(16);
    tx.send(record(LogLevel::System, "runtime-status", "ready")).unwrap();
    tx.send(record(LogLevel::System, "runtime-status", "killed")).unwrap();

    let found = wait_for_log(&mut rx, LogLevel::System, "runtime-status", |r| r.text == "killed")
        .await
        .unwrap();
    assert_eq!(found.text, "killed");
}

#[tokio::test]
async fn terminal_sentinel_yields_no_matching_log() {
    let (tx, mut rx) = broadcast::channel(16);
    tx.send(record(LogLevel::Info, "log", "unrelated")).unwrap();
    tx.send(LogRecord {
        level: LogLevel::System,
        r#type: "runtime-exited".to_string(),
        text: String::new(),
        data: serde_json::json!({}),
    })
    .unwrap();

    let result = wait_for_log(&mut rx, LogLevel::System, "triggers-parsed", |_| true).await;
    assert_eq!(result, Err(WaitError::NoMatchingLog));
}

#[tokio::test]
async fn closed_channel_without_sentinel_yields_no_matching_log() {
    let (tx, mut rx) = broadcast::channel(16);
    tx.send(record(LogLevel::Info, "log", "unrelated")).unwrap();
    drop(tx);

    let result = wait_for_log(&mut rx, LogLevel::System, "triggers-parsed", |_| true).await;
    assert_eq!(result, Err(WaitError::NoMatchingLog));
}
