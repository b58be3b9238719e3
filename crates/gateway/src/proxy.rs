// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invocation proxy: for a matched route, spawns a fresh
//! worker for the requested trigger, waits for it to announce the triggers
//! it knows about, and either streams an HTTP conversation over the
//! worker's IPC socket (HTTP triggers) or waits for the worker to exit and
//! acknowledges (event triggers).

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use fxemu_core::{LogLevel, RuntimeBundle, TriggerDefinition, TriggerKind};
use fxemu_runtime::{wait_for_log, Runtime};
use http_body_util::Full;
use hyper::client::conn::http1 as client_http1;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex as SyncMutex;
use serde::Deserialize;
use tokio::net::UnixStream;

use crate::config::GatewayConfig;
use crate::display;
use crate::error::ProxyError;

#[derive(Debug, Deserialize)]
struct TriggerEntry {
    definition: TriggerDefinition,
}

#[derive(Debug, Deserialize)]
struct PerInvocationTriggersParsed {
    #[serde(default)]
    triggers: HashMap<String, TriggerEntry>,
}

/// Everything the proxy needs out of an incoming request; assembled by the
/// axum handler in `server.rs` after buffering the body fully in memory.
pub struct InvokeRequest {
    pub trigger_name: String,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Run one invocation end to end, always returning a [`Response`] — worker
/// failures are translated into an HTTP status rather than propagated —
/// a failed invocation never takes the gateway process down with it.
pub async fn handle_invocation(config: &GatewayConfig, req: InvokeRequest) -> Response {
    match handle_invocation_inner(config, req).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn handle_invocation_inner(
    config: &GatewayConfig,
    req: InvokeRequest,
) -> Result<Response, ProxyError> {
    let proto = if req.body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&req.body)?)
    };

    let bundle = RuntimeBundle {
        project_id: config.project_id.clone(),
        cwd: config.functions_dir.clone(),
        trigger_id: req.trigger_name.clone(),
        proto,
        sibling_port_directory: config.sibling_port_directory.clone(),
        disabled_features: config.disabled_features.clone(),
    };
    let opts = config.spawn_options();
    let mut runtime = Runtime::spawn(&bundle, &opts).await?;

    // Subscriptions MUST be taken before any await that could let the
    // worker's early log events pass.
    let mut display_rx = runtime.subscribe();
    let mut wait_rx = runtime.subscribe();
    let fatal_rx = runtime.subscribe();

    let trigger_name = req.trigger_name.clone();
    let display_task = tokio::spawn(async move { display::forward_all(&mut display_rx, &trigger_name).await });
    let fatal_text: Arc<SyncMutex<Option<String>>> = Arc::new(SyncMutex::new(None));
    let fatal_task = tokio::spawn(watch_fatal(fatal_rx, Arc::clone(&fatal_text)));

    let result = run_invocation(&mut runtime, &req, &mut wait_rx).await;

    let _ = display_task.await;
    // `watch_fatal` self-terminates on the same `runtime-exited` sentinel
    // `display_task` does; await it rather than abort so `fatal_text` is
    // fully populated before `fallback_response` reads it.
    let _ = fatal_task.await;

    result.or_else(|err| Ok(fallback_response(err, &fatal_text)))
}

async fn watch_fatal(
    mut rx: tokio::sync::broadcast::Receiver<fxemu_core::LogRecord>,
    sink: Arc<SyncMutex<Option<String>>>,
) {
    loop {
        match rx.recv().await {
            Ok(record) => {
                if record.level == LogLevel::Fatal {
                    *sink.lock() = Some(record.text.clone());
                }
                if record.is_system("runtime-exited") {
                    return;
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn run_invocation(
    runtime: &mut Runtime,
    req: &InvokeRequest,
    wait_rx: &mut tokio::sync::broadcast::Receiver<fxemu_core::LogRecord>,
) -> Result<Response, ProxyError> {
    let socket_path = runtime.ready().await?;

    let parsed = wait_for_log(wait_rx, LogLevel::System, "triggers-parsed", |_| true)
        .await
        .map_err(|_| ProxyError::NoTriggersParsed)?;
    let data: PerInvocationTriggersParsed = serde_json::from_value(parsed.data)?;

    let entry = data
        .triggers
        .get(&req.trigger_name)
        .ok_or_else(|| ProxyError::UnknownTrigger(req.trigger_name.clone()))?;
    if !entry.definition.is_supported() {
        return Err(ProxyError::UnsupportedTrigger(req.trigger_name.clone()));
    }

    let service = match &entry.definition.kind {
        TriggerKind::Http { .. } => "https",
        TriggerKind::Event { service, .. } => service.as_str(),
    };
    tracing::info!(trigger = %req.trigger_name, service, "invocation");

    match &entry.definition.kind {
        TriggerKind::Event { .. } => {
            // The worker's own side-effect execution is opaque to the
            // gateway; ACK regardless of exit code.
            let _ = runtime.exit().await;
            Ok((
                StatusCode::OK,
                axum::Json(serde_json::json!({ "status": "acknowledged" })),
            )
                .into_response())
        }
        TriggerKind::Http { .. } => {
            let response = proxy_http(&socket_path, req).await?;
            let _ = runtime.exit().await;
            Ok(response)
        }
    }
}

/// Dial the worker's announced Unix socket, forward the request verbatim,
/// and stream the response body back. No connection pooling: one fresh
/// socket per invocation.
async fn proxy_http(socket_path: &str, req: &InvokeRequest) -> Result<Response, ProxyError> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|err| ProxyError::IpcTransportError(err.to_string()))?;
    let io = TokioIo::new(stream);

    let (mut sender, connection) = client_http1::handshake::<_, Full<Bytes>>(io)
        .await
        .map_err(|err| ProxyError::IpcTransportError(err.to_string()))?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            tracing::debug!(error = %err, "worker IPC connection closed");
        }
    });

    let path_and_query = req
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut builder = hyper::Request::builder().method(req.method.clone()).uri(path_and_query);
    for (name, value) in req.headers.iter() {
        builder = builder.header(name, value);
    }
    let outbound = builder
        .body(Full::new(req.body.clone()))
        .map_err(|err| ProxyError::IpcTransportError(err.to_string()))?;

    let ipc_response = sender
        .send_request(outbound)
        .await
        .map_err(|err| ProxyError::IpcTransportError(err.to_string()))?;

    // hyper always parses a concrete status line, so there's no need to
    // default a missing one the way a hand-rolled parser would.
    let (parts, body) = ipc_response.into_parts();
    let mut response = Response::builder().status(parts.status);
    for (name, value) in parts.headers.iter() {
        response = response.header(name, value);
    }
    response
        .body(axum::body::Body::new(body))
        .map_err(|err| ProxyError::IpcTransportError(err.to_string()))
}

fn fallback_response(err: ProxyError, fatal_text: &Arc<SyncMutex<Option<String>>>) -> Response {
    if let Some(text) = fatal_text.lock().clone() {
        return (StatusCode::INTERNAL_SERVER_ERROR, text).into_response();
    }
    err.into_response()
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
