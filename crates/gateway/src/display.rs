// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes a worker's parsed log stream onto `tracing` by severity. The
//! trigger loader and invocation proxy both hand their log records here;
//! the CLI's own terminal styling is an external collaborator and out of
//! scope for this module.

use fxemu_core::{LogLevel, LogRecord};
use tokio::sync::broadcast;

/// Forward one record to `tracing` at the level its [`LogLevel`] maps to.
pub fn forward_to_tracing(record: &LogRecord, trigger_id: &str) {
    match record.level {
        LogLevel::System => tracing::debug!(
            trigger_id,
            r#type = %record.r#type,
            data = %record.data,
            "worker system record"
        ),
        LogLevel::User | LogLevel::Info => tracing::info!(
            trigger_id,
            r#type = %record.r#type,
            "{}",
            record.text
        ),
        LogLevel::Debug => tracing::debug!(
            trigger_id,
            r#type = %record.r#type,
            "{}",
            record.text
        ),
        LogLevel::Warn => tracing::warn!(
            trigger_id,
            r#type = %record.r#type,
            data = %record.data,
            "{}",
            record.text
        ),
        LogLevel::Fatal => tracing::error!(
            trigger_id,
            r#type = %record.r#type,
            "{}",
            record.text
        ),
    }
}

/// Drain a subscription to completion, forwarding every record to `tracing`.
/// Stops at the supervisor's `runtime-exited` sentinel (see
/// `fxemu-runtime::runtime::terminal_record`) rather than waiting for the
/// channel to close, since the owning [`fxemu_runtime::Runtime`] keeps a
/// sender alive for the lifetime of the handle.
pub async fn forward_all(rx: &mut broadcast::Receiver<LogRecord>, trigger_id: &str) {
    loop {
        match rx.recv().await {
            Ok(record) => {
                if record.is_system("runtime-exited") {
                    return;
                }
                forward_to_tracing(&record, trigger_id);
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
