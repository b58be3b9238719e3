// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The library-level surface a CLI front-end builds on: `start()`,
//! `connect()`, `stop()`, `get_info()`, `get_triggers()`. Argument parsing
//! and process exit codes belong to that front-end, not here.

use std::net::SocketAddr;
use std::sync::Arc;

use fxemu_core::TriggerDefinition;
use notify::RecommendedWatcher;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;
use crate::error::LoaderError;
use crate::loader::{self, TriggerLoader};
use crate::server;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind gateway listener: {0}")]
    Bind(#[source] std::io::Error),
}

/// Cheaply cloneable handle shared by every axum request future.
#[derive(Clone)]
pub struct GatewayState {
    pub(crate) config: Arc<GatewayConfig>,
    pub(crate) loader: TriggerLoader,
}

impl GatewayState {
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn loader(&self) -> &TriggerLoader {
        &self.loader
    }
}

/// Owns the bound listener, the filesystem watcher, and the trigger table
/// for the lifetime of one emulator process.
pub struct Gateway {
    state: GatewayState,
    server_handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    watcher: Mutex<Option<RecommendedWatcher>>,
    watcher_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        let config = Arc::new(config);
        let loader = TriggerLoader::new(Arc::clone(&config));
        Self {
            state: GatewayState { config, loader },
            server_handle: Mutex::new(None),
            shutdown_tx: Mutex::new(None),
            watcher: Mutex::new(None),
            watcher_handle: Mutex::new(None),
        }
    }

    /// Bind the configured `(host, port)` and begin serving. Does not load
    /// any triggers by itself — call [`Gateway::connect`] for that.
    pub async fn start(&self) -> Result<(), GatewayError> {
        let addr: SocketAddr = format!("{}:{}", self.state.config.host, self.state.config.port)
            .parse()
            .map_err(|err: std::net::AddrParseError| {
                GatewayError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, err))
            })?;
        let listener = TcpListener::bind(addr).await.map_err(GatewayError::Bind)?;
        let app = server::router(self.state.clone());

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(err) = serve.await {
                tracing::error!(error = %err, "gateway server exited with an error");
            }
        });

        *self.server_handle.lock() = Some(handle);
        *self.shutdown_tx.lock() = Some(tx);
        Ok(())
    }

    /// Run the first trigger load immediately (un-debounced), then install
    /// the debounced filesystem watcher for subsequent reloads. A failed
    /// watch install is logged but does not fail `connect()` itself —
    /// reloads are still reachable via `GET /` or a later explicit call.
    pub async fn connect(&self) -> Result<usize, LoaderError> {
        let count = self.state.loader.reload().await?;

        match loader::watch(self.state.config.functions_dir.clone(), self.state.loader.clone()) {
            Ok((watcher, handle)) => {
                *self.watcher.lock() = Some(watcher);
                *self.watcher_handle.lock() = Some(handle);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install functions directory watcher");
            }
        }

        Ok(count)
    }

    /// Close the listening socket. Fire-and-forget: does not await in-flight
    /// requests draining.
    pub fn stop(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.watcher_handle.lock().take() {
            handle.abort();
        }
        self.watcher.lock().take();
    }

    pub fn get_info(&self) -> GatewayInfo {
        GatewayInfo {
            host: self.state.config.host.clone(),
            port: self.state.config.port,
        }
    }

    pub fn get_triggers(&self) -> Vec<TriggerDefinition> {
        self.state.loader.table().values().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayInfo {
    pub host: String,
    pub port: u16,
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
