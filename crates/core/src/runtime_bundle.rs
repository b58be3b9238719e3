// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-invocation input handed to a worker at spawn time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serialized once at spawn and never mutated afterward.
///
/// An empty `trigger_id` means "diagnostic run": the worker should enumerate
/// its triggers and exit rather than handle an invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeBundle {
    pub project_id: String,
    pub cwd: PathBuf,
    #[serde(rename = "triggerId")]
    pub trigger_id: String,
    #[serde(default, rename = "proto", skip_serializing_if = "Option::is_none")]
    pub proto: Option<Value>,
    #[serde(rename = "siblingPortDirectory")]
    pub sibling_port_directory: std::collections::HashMap<String, u16>,
    #[serde(default)]
    pub disabled_features: Vec<String>,
}

impl RuntimeBundle {
    /// A diagnostic bundle: `trigger_id` empty, no payload.
    pub fn diagnostic(
        project_id: impl Into<String>,
        cwd: PathBuf,
        sibling_port_directory: std::collections::HashMap<String, u16>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            cwd,
            trigger_id: String::new(),
            proto: None,
            sibling_port_directory,
            disabled_features: Vec::new(),
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        self.trigger_id.is_empty()
    }
}

#[cfg(test)]
#[path = "runtime_bundle_tests.rs"]
mod tests;
