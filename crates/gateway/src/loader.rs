// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger-discovery reload loop: spawns a diagnostic worker to enumerate a
//! project's triggers, publishes the result, and registers newly discovered
//! event triggers with sibling emulators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fxemu_core::{KnownTriggerSet, LogLevel, TriggerDefinition, TriggerTable};
use fxemu_runtime::{wait_for_log, Runtime, SpawnOptions};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;
use crate::display;
use crate::error::LoaderError;
use crate::registrar::SiblingRegistrar;

const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct TriggersParsedData {
    #[serde(rename = "triggerDefinitions", default)]
    trigger_definitions: Vec<TriggerDefinition>,
}

/// Shared, cloneable handle onto the trigger-discovery state: the published
/// [`TriggerTable`], the monotonic [`KnownTriggerSet`], and everything
/// needed to run a reload.
#[derive(Clone)]
pub struct TriggerLoader {
    config: Arc<GatewayConfig>,
    table: Arc<Mutex<Arc<TriggerTable>>>,
    known: Arc<Mutex<KnownTriggerSet>>,
    registrar: SiblingRegistrar,
    reload_lock: Arc<AsyncMutex<()>>,
}

impl TriggerLoader {
    pub fn new(config: Arc<GatewayConfig>) -> Self {
        Self {
            config,
            table: Arc::new(Mutex::new(Arc::new(TriggerTable::new()))),
            known: Arc::new(Mutex::new(KnownTriggerSet::new())),
            registrar: SiblingRegistrar::new(),
            reload_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Snapshot of the currently published trigger table.
    pub fn table(&self) -> Arc<TriggerTable> {
        self.table.lock().clone()
    }

    /// Run one reload cycle: spawn a diagnostic worker, await its
    /// `triggers-parsed` record, publish the resulting table, and register
    /// any newly discovered event triggers with their sibling emulator.
    /// Serialized against concurrent callers (the debounce task and any
    /// explicit reload) by an internal lock.
    pub async fn reload(&self) -> Result<usize, LoaderError> {
        let _guard = self.reload_lock.lock().await;

        let bundle = fxemu_core::RuntimeBundle::diagnostic(
            self.config.project_id.clone(),
            self.config.functions_dir.clone(),
            self.config.sibling_port_directory.clone(),
        );
        let opts: SpawnOptions = self.config.spawn_options();

        let mut runtime = Runtime::spawn(&bundle, &opts).await?;
        let mut display_rx = runtime.subscribe();
        let mut wait_rx = runtime.subscribe();

        let display_task: JoinHandle<()> =
            tokio::spawn(async move { display::forward_all(&mut display_rx, "").await });

        let waited = wait_for_log(&mut wait_rx, LogLevel::System, "triggers-parsed", |_| true).await;
        let _ = runtime.exit().await;
        let _ = display_task.await;

        let record = waited.map_err(|_| LoaderError::NoTriggersParsed)?;
        let data: TriggersParsedData = serde_json::from_value(record.data)?;

        let new_table: TriggerTable = data
            .trigger_definitions
            .into_iter()
            .map(|def| (def.name.clone(), def))
            .collect();
        let count = new_table.len();
        self.register_new_triggers(&new_table).await;
        *self.table.lock() = Arc::new(new_table);

        Ok(count)
    }

    async fn register_new_triggers(&self, new_table: &TriggerTable) {
        for (name, definition) in new_table {
            let already_known = self.known.lock().contains(name.as_str());
            if already_known {
                continue;
            }
            self.handle_new_trigger(name, definition).await;
            self.known.lock().insert(name.clone());
        }
    }

    async fn handle_new_trigger(&self, name: &str, definition: &TriggerDefinition) {
        use fxemu_core::TriggerKind;

        match &definition.kind {
            TriggerKind::Http { .. } => {
                let url = definition
                    .public_url(&self.config.host, self.config.port, &self.config.project_id)
                    .unwrap_or_default();
                tracing::info!(trigger = name, url, "http trigger registered");
            }
            TriggerKind::Event { service, event_trigger, .. } if service == "firestore" => {
                let Some(&port) = self.config.sibling_port_directory.get(service) else {
                    tracing::warn!(trigger = name, service, "sibling port unknown, skipping registration");
                    return;
                };
                if let Err(err) = self
                    .registrar
                    .register(&self.config.host, port, &self.config.project_id, name, event_trigger)
                    .await
                {
                    tracing::warn!(trigger = name, error = %err, "sibling registration failed");
                }
            }
            TriggerKind::Event { service, .. } => {
                tracing::warn!(trigger = name, service, "unsupported service");
            }
        }
    }
}

/// Paths under `node_modules`, any dot-prefixed component, or ending in
/// `.log` never reach the debounce task.
fn is_relevant_path(path: &Path) -> bool {
    let ignored_component = path.components().any(|component| {
        let part = component.as_os_str();
        part == "node_modules" || part.to_string_lossy().starts_with('.')
    });
    if ignored_component {
        return false;
    }
    path.extension().map(|ext| ext != "log").unwrap_or(true)
}

/// Install a filesystem watcher on `functions_dir` that debounces changes
/// (trailing edge, 1s) into calls to `loader.reload()`. The returned
/// [`RecommendedWatcher`] must be kept alive for as long as watching should
/// continue; dropping it stops the underlying OS watch.
pub fn watch(
    functions_dir: PathBuf,
    loader: TriggerLoader,
) -> notify::Result<(RecommendedWatcher, JoinHandle<()>)> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        if event.paths.iter().any(|p| is_relevant_path(p)) {
            let _ = tx.send(());
        }
    })?;
    watcher.watch(&functions_dir, RecursiveMode::Recursive)?;

    let handle = tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Trailing-edge debounce: keep absorbing events that arrive
            // within the window, resetting the clock on each one.
            loop {
                match tokio::time::timeout(DEBOUNCE_WINDOW, rx.recv()).await {
                    Ok(Some(())) => continue,
                    Ok(None) | Err(_) => break,
                }
            }
            if let Err(err) = loader.reload().await {
                tracing::warn!(error = %err, "trigger reload failed");
            }
        }
    });

    Ok((watcher, handle))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
