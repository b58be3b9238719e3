// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io;

use thiserror::Error;

/// Failures that can occur while spawning, awaiting, or signaling a worker.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to spawn worker process: {0}")]
    SpawnFailed(#[source] io::Error),

    #[error("worker exited before announcing readiness")]
    WorkerExitedBeforeReady,

    #[error("ready() or exit() was already awaited on this runtime")]
    AlreadyAwaited,

    #[error("failed to signal worker process: {0}")]
    Kill(#[source] nix::errno::Errno),
}
