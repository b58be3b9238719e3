// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Everything `Runtime::spawn` needs beyond the [`fxemu_core::RuntimeBundle`]
/// itself: where the node binary and runtime entry point live, and any
/// per-spawn tuning.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub node_binary: PathBuf,
    pub runtime_entry_path: PathBuf,
    /// Pre-serialized trigger list passed as argv[2] for the cached-trigger
    /// fast path; empty string for a cold/diagnostic spawn.
    pub cached_triggers: Option<String>,
    pub extra_env: Vec<(String, String)>,
    /// Channel depth for the log broadcast. Lagging subscribers drop the
    /// oldest records rather than block the tee task.
    pub log_channel_capacity: usize,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            node_binary: PathBuf::from("node"),
            runtime_entry_path: PathBuf::new(),
            cached_triggers: None,
            extra_env: Vec::new(),
            log_channel_capacity: 1024,
        }
    }
}
