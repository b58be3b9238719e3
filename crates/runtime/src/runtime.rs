// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns one worker process and supervises it for the lifetime of a single
//! invocation or diagnostic run.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{stream, StreamExt};
use fxemu_core::{LogLevel, LogRecord, RuntimeBundle};
use fxemu_wire::LogCodec;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{broadcast, oneshot};
use tokio_util::codec::FramedRead;

use crate::error::RuntimeError;
use crate::options::SpawnOptions;

/// A live worker. Each instance is owned by exactly one caller: one
/// invocation, or one trigger-loader diagnostic run.
pub struct Runtime {
    pid: Pid,
    log_tx: broadcast::Sender<LogRecord>,
    ready_rx: Option<oneshot::Receiver<String>>,
    exit_rx: Option<oneshot::Receiver<ExitStatus>>,
    kill_guard: Arc<AtomicBool>,
}

impl Runtime {
    /// Default signal used for the FATAL-triggered auto-kill.
    pub const DEFAULT_SIGNAL: Signal = Signal::SIGTERM;

    /// Spawn `<node_binary> <runtime_entry_path> <bundle_json> <triggers_json>`
    /// and start the background tee task.
    pub async fn spawn(bundle: &RuntimeBundle, opts: &SpawnOptions) -> Result<Self, RuntimeError> {
        let bundle_json = serde_json::to_string(bundle)
            .map_err(|err| RuntimeError::SpawnFailed(io::Error::new(io::ErrorKind::InvalidData, err)))?;
        let triggers_json = opts.cached_triggers.clone().unwrap_or_default();

        let mut command = Command::new(&opts.node_binary);
        command
            .arg(&opts.runtime_entry_path)
            .arg(bundle_json)
            .arg(triggers_json)
            .current_dir(&bundle.cwd)
            .env("node", &opts.node_binary)
            .envs(opts.extra_env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(RuntimeError::SpawnFailed)?;

        let raw_pid = child
            .id()
            .ok_or_else(|| RuntimeError::SpawnFailed(io::Error::other("spawned child has no pid")))?;
        let pid = Pid::from_raw(raw_pid as i32);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RuntimeError::SpawnFailed(io::Error::other("spawned child missing stdout pipe")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RuntimeError::SpawnFailed(io::Error::other("spawned child missing stderr pipe")))?;

        let (log_tx, _) = broadcast::channel(opts.log_channel_capacity);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = oneshot::channel();
        let kill_guard = Arc::new(AtomicBool::new(false));

        tokio::spawn(supervise(
            child,
            stdout,
            stderr,
            pid,
            log_tx.clone(),
            ready_tx,
            exit_tx,
            Arc::clone(&kill_guard),
        ));

        Ok(Self {
            pid,
            log_tx,
            ready_rx: Some(ready_rx),
            exit_rx: Some(exit_rx),
            kill_guard,
        })
    }

    /// Subscribe to this worker's demultiplexed log stream. Call this
    /// *before* awaiting `ready`/`exit` so no records are missed.
    pub fn subscribe(&self) -> broadcast::Receiver<LogRecord> {
        self.log_tx.subscribe()
    }

    /// Resolves with the worker-announced IPC socket path, or
    /// `WorkerExitedBeforeReady` if the worker exited first. May only be
    /// awaited once.
    pub async fn ready(&mut self) -> Result<String, RuntimeError> {
        let rx = self.ready_rx.take().ok_or(RuntimeError::AlreadyAwaited)?;
        rx.await.map_err(|_| RuntimeError::WorkerExitedBeforeReady)
    }

    /// Resolves with the worker's exit status. May only be awaited once.
    pub async fn exit(&mut self) -> Result<ExitStatus, RuntimeError> {
        let rx = self.exit_rx.take().ok_or(RuntimeError::AlreadyAwaited)?;
        rx.await.map_err(|_| RuntimeError::WorkerExitedBeforeReady)
    }

    /// Signal the worker and publish a synthetic `killed` record. Idempotent:
    /// a second call (or a race with the FATAL-triggered auto-kill) is a
    /// no-op.
    pub fn kill(&self, signal: Signal) -> Result<(), RuntimeError> {
        if self.kill_guard.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match signal::kill(self.pid, signal) {
            Ok(()) => {
                let _ = self.log_tx.send(LogRecord::killed());
                Ok(())
            }
            Err(nix::errno::Errno::ESRCH) => Ok(()), // already exited
            Err(err) => {
                self.kill_guard.store(false, Ordering::SeqCst);
                Err(RuntimeError::Kill(err))
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn supervise(
    mut child: Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    pid: Pid,
    log_tx: broadcast::Sender<LogRecord>,
    ready_tx: oneshot::Sender<String>,
    exit_tx: oneshot::Sender<ExitStatus>,
    kill_guard: Arc<AtomicBool>,
) {
    let out = FramedRead::new(stdout, LogCodec);
    let err = FramedRead::new(stderr, LogCodec);
    let mut combined = stream::select(out, err);

    let mut ready_tx = Some(ready_tx);

    while let Some(next) = combined.next().await {
        let record = match next {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read worker log pipe");
                continue;
            }
        };

        let _ = log_tx.send(record.clone());

        if let Some(path) = record.socket_path() {
            if let Some(tx) = ready_tx.take() {
                let _ = tx.send(path.to_string());
            }
        }

        if record.level == LogLevel::Fatal && !kill_guard.swap(true, Ordering::SeqCst) {
            let _ = signal::kill(pid, Runtime::DEFAULT_SIGNAL);
            let _ = log_tx.send(LogRecord::killed());
        }
    }

    let _ = log_tx.send(terminal_record());
    if let Ok(status) = child.wait().await {
        let _ = exit_tx.send(status);
    }
    drop(ready_tx);
}

/// Sentinel published once the tee task has drained both pipes to EOF, so a
/// waiter can tell "channel will never match" apart from "still running"
/// without relying on every `Sender` clone being dropped (the `Runtime`
/// itself keeps one alive for late `subscribe()` calls).
fn terminal_record() -> LogRecord {
    LogRecord {
        level: LogLevel::System,
        r#type: "runtime-exited".to_string(),
        text: String::new(),
        data: serde_json::json!({}),
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
