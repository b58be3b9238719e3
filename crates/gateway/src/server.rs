// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway HTTP server: routes external requests to the invocation proxy,
//! plus the diagnostic `GET /` enumeration route.

use std::collections::HashMap;

use axum::extract::{OriginalUri, Path, State};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::gateway::GatewayState;
use crate::proxy::{self, InvokeRequest};

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(list_triggers))
        .route(
            "/:project_id/:region/:trigger_name",
            get(invoke).post(invoke),
        )
        .route(
            "/:project_id/:region/:trigger_name/*rest",
            get(invoke).post(invoke),
        )
        .route(
            "/functions/projects/:project_id/triggers/:trigger_name",
            get(invoke).post(invoke),
        )
        .route(
            "/functions/projects/:project_id/triggers/:trigger_name/*rest",
            get(invoke).post(invoke),
        )
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS, Method::POST])
        .allow_headers([
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            AUTHORIZATION,
            ACCEPT,
        ])
}

/// `GET /`: a fresh diagnostic run, enumerating the project's current
/// triggers. Diagnostic-only; no performance guarantee.
async fn list_triggers(State(state): State<GatewayState>) -> Response {
    if let Err(err) = state.loader().reload().await {
        tracing::warn!(error = %err, "diagnostic reload for GET / failed");
    }
    let triggers: Vec<_> = state.loader().table().values().cloned().collect();
    Json(triggers).into_response()
}

async fn invoke(
    State(state): State<GatewayState>,
    Path(params): Path<HashMap<String, String>>,
    method: Method,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    body: axum::body::Bytes,
) -> Response {
    let Some(trigger_name) = params.get("trigger_name").cloned() else {
        return (StatusCode::NOT_FOUND, "no trigger_name in route").into_response();
    };

    proxy::handle_invocation(
        state.config(),
        InvokeRequest { trigger_name, method, uri, headers, body },
    )
    .await
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
