// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Standalone worker process used only by `fxemu-gateway`'s black-box
//! integration tests. Speaks the same wire protocol a real functions
//! runtime would: announces a Unix socket, emits `triggers-parsed`, and for
//! the `echo` trigger serves one HTTP/1.1 request over that socket before
//! exiting. Built as an ordinary binary target rather than a shell script
//! because framing real HTTP/1.1 by hand in `sh` is not practical.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::convert::Infallible;
use std::path::PathBuf;

use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::net::UnixListener;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut args = std::env::args();
    let bundle_json = args.nth(2).unwrap_or_default();
    let bundle: Value = serde_json::from_str(&bundle_json).unwrap_or_else(|_| json!({}));
    let trigger_id = bundle.get("triggerId").and_then(Value::as_str).unwrap_or("").to_string();

    let socket_path = std::env::temp_dir().join(format!("fxemu-fake-worker-{}.sock", std::process::id()));
    let _ = std::fs::remove_file(&socket_path);

    emit(&json!({
        "level": "SYSTEM",
        "type": "runtime-status",
        "text": "ready",
        "data": {"socketPath": socket_path.to_string_lossy()},
    }));

    emit(&json!({
        "level": "SYSTEM",
        "type": "triggers-parsed",
        "text": "",
        "data": {
            "triggers": {
                "echo": {
                    "definition": {"name": "echo", "triggerKind": "http", "region": "us-central1"},
                },
                "onWrite": {
                    "definition": {
                        "name": "onWrite",
                        "triggerKind": "event",
                        "service": "firestore",
                        "region": "us-central1",
                        "eventTrigger": {},
                    },
                },
            },
        },
    }));

    if trigger_id == "echo" {
        serve_one_echo(&socket_path).await;
        let _ = std::fs::remove_file(&socket_path);
    }
}

fn emit(record: &Value) {
    println!("{record}");
}

async fn serve_one_echo(socket_path: &PathBuf) {
    let Ok(listener) = UnixListener::bind(socket_path) else {
        return;
    };
    let Ok((stream, _)) = listener.accept().await else {
        return;
    };
    let io = TokioIo::new(stream);

    let service = service_fn(|req: Request<Incoming>| async move {
        let echoed_path = req.uri().path_and_query().map(|pq| pq.as_str().to_string()).unwrap_or_default();
        let body = req.into_body().collect().await.map(|collected| collected.to_bytes()).unwrap_or_default();
        Ok::<_, Infallible>(
            Response::builder()
                .status(200)
                .header("x-echo-path", echoed_path)
                .body(Full::new(body))
                .expect("well-formed echo response"),
        )
    });

    let _ = hyper::server::conn::http1::Builder::new().serve_connection(io, service).await;
}
