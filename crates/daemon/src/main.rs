// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Functions emulator gateway daemon (`fxemu`).
//!
//! Process entry point: loads configuration from the environment, sets up
//! structured logging, binds the gateway's listener, runs the first trigger
//! load, and waits for a shutdown signal. Everything interesting — the
//! invocation lifecycle, the trigger loader, the log demultiplexer — lives
//! in `fxemu-gateway` and its dependencies; this binary only wires them
//! together.

use std::process::ExitCode;

use fxemu_gateway::{Gateway, GatewayConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("fxemu {}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            "--help" | "-h" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: fxemu [--help | --version]");
                return ExitCode::FAILURE;
            }
        }
    }

    setup_logging();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load gateway configuration");
            return ExitCode::FAILURE;
        }
    };

    info!(host = %config.host, port = config.port, project_id = %config.project_id, "starting functions emulator gateway");

    let gateway = Gateway::new(config);

    if let Err(err) = gateway.start().await {
        error!(error = %err, "failed to bind gateway listener");
        return ExitCode::FAILURE;
    }

    let info = gateway.get_info();
    match gateway.connect().await {
        Ok(count) => info!(triggers = count, "initial trigger load complete"),
        Err(err) => error!(error = %err, "initial trigger load failed, continuing with an empty table"),
    }

    info!("listening on http://{}:{}", info.host, info.port);
    println!("READY");

    wait_for_shutdown().await;

    info!("shutting down");
    gateway.stop();

    ExitCode::SUCCESS
}

/// Block until SIGTERM or SIGINT. `stop()` only closes the listening
/// socket; it does not await in-flight request drain.
async fn wait_for_shutdown() {
    let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
        // Platform without SIGTERM (shouldn't happen under the targeted
        // Unix hosts); fall back to Ctrl+C only.
        let _ = tokio::signal::ctrl_c().await;
        return;
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
    }
}

/// `EnvFilter` + `fmt` layer to stdout. This process keeps no state across
/// restarts, so logs go straight to stdout rather than a rotated file.
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

fn print_help() {
    println!("fxemu {}", env!("CARGO_PKG_VERSION"));
    println!("Local emulator gateway for serverless functions.");
    println!();
    println!("USAGE:");
    println!("    fxemu");
    println!();
    println!("Configuration is read from the environment; see fxemu_gateway::GatewayConfig:");
    println!("    FXEMU_HOST                  bind host (default: localhost)");
    println!("    FXEMU_PORT                  bind port (default: 5001)");
    println!("    FXEMU_PROJECT_ID            project id (default: demo-project)");
    println!("    FXEMU_FUNCTIONS_DIR         functions source directory (default: cwd)");
    println!("    FXEMU_NODE_BINARY           node binary used to spawn workers (default: node)");
    println!("    FXEMU_RUNTIME_ENTRY_PATH    worker entry script");
    println!("    FXEMU_SIBLING_PORTS         comma-separated name=port pairs (e.g. firestore=8080)");
    println!("    FXEMU_DISABLED_FEATURES     comma-separated feature flags to disable");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}
