// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds for the trigger loader, sibling registrar, and invocation
//! proxy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fxemu_runtime::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to spawn diagnostic worker: {0}")]
    Spawn(#[from] RuntimeError),

    #[error("diagnostic worker never emitted triggers-parsed")]
    NoTriggersParsed,

    #[error("could not parse trigger definitions: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("sibling registration request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Invocation-proxy error kinds, mapped to an HTTP status by
/// [`IntoResponse`]: 4xx for `BadPayload`, 5xx for everything else
/// (worker failure modes are opaque to the caller by design).
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("request body is not valid JSON: {0}")]
    BadPayload(#[from] serde_json::Error),

    #[error("worker supervisor error: {0}")]
    Worker(#[from] RuntimeError),

    #[error("unknown trigger: {0}")]
    UnknownTrigger(String),

    #[error("unsupported trigger: {0}")]
    UnsupportedTrigger(String),

    #[error("worker never emitted triggers-parsed")]
    NoTriggersParsed,

    #[error("worker IPC connection failed: {0}")]
    IpcTransportError(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::BadPayload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
