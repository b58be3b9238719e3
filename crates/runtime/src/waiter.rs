// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Waits for a specific log record on a subscription obtained from
//! [`crate::Runtime::subscribe`].

use fxemu_core::{LogLevel, LogRecord};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    #[error("no matching log record arrived before the worker exited")]
    NoMatchingLog,
}

/// Resolve on the first record matching `level`, `r#type`, and `predicate`.
/// Resolves `Err(NoMatchingLog)` once the worker has exited (the supervisor's
/// terminal sentinel, or the channel closing outright) without a match ever
/// arriving.
pub async fn wait_for_log(
    rx: &mut broadcast::Receiver<LogRecord>,
    level: LogLevel,
    r#type: &str,
    predicate: impl Fn(&LogRecord) -> bool,
) -> Result<LogRecord, WaitError> {
    loop {
        match rx.recv().await {
            Ok(record) => {
                if record.level == level && record.r#type == r#type && predicate(&record) {
                    return Ok(record);
                }
                if record.is_system("runtime-exited") {
                    return Err(WaitError::NoMatchingLog);
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return Err(WaitError::NoMatchingLog),
        }
    }
}

#[cfg(test)]
#[path = "waiter_tests.rs"]
mod tests;
