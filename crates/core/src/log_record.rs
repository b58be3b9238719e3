// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shape of one line of a worker's structured log stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a [`LogRecord`]. `System` carries control signals between
/// the worker and the gateway; every other level is for display/forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    System,
    User,
    Debug,
    Info,
    Warn,
    Fatal,
}

/// One parsed line from a worker's stdout or stderr.
///
/// Unknown fields on the wire are not preserved individually; `data` is an
/// open JSON object and carries whatever the worker sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_data")]
    pub data: Value,
}

fn default_data() -> Value {
    Value::Object(serde_json::Map::new())
}

impl LogRecord {
    /// Build the synthetic record the codec emits when a line fails to
    /// parse as a `LogRecord`. Never silently discarded.
    pub fn parse_error(offending_line: &str) -> Self {
        Self {
            level: LogLevel::System,
            r#type: "runtime-parse-error".to_string(),
            text: offending_line.to_string(),
            data: Value::Object(serde_json::Map::new()),
        }
    }

    /// Build the synthetic record emitted when the supervisor kills a
    /// worker, either because of a FATAL log or an explicit `kill()`.
    pub fn killed() -> Self {
        Self {
            level: LogLevel::System,
            r#type: "runtime-status".to_string(),
            text: "killed".to_string(),
            data: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn is_system(&self, r#type: &str) -> bool {
        self.level == LogLevel::System && self.r#type == r#type
    }

    /// `true` for the `SYSTEM/runtime-status="ready"` record.
    pub fn is_ready(&self) -> bool {
        self.is_system("runtime-status") && self.text == "ready"
    }

    /// The socket path announced by a ready record, if this is one.
    pub fn socket_path(&self) -> Option<&str> {
        if !self.is_ready() {
            return None;
        }
        self.data.get("socketPath").and_then(Value::as_str)
    }
}

#[cfg(test)]
#[path = "log_record_tests.rs"]
mod tests;
