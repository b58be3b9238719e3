// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway configuration, loaded from `FXEMU_*` environment variables.
//!
//! Credentialed configuration fetchers live outside this process; the plain
//! env-backed loader here covers only what the gateway itself needs to bind
//! a port and spawn workers.

use std::collections::HashMap;
use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;

use fxemu_runtime::SpawnOptions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid FXEMU_PORT: {0}")]
    InvalidPort(#[source] ParseIntError),

    #[error("invalid entry in FXEMU_SIBLING_PORTS: {0:?} (want name=port)")]
    InvalidSiblingPort(String),

    #[error("could not determine functions directory: {0}")]
    FunctionsDir(#[source] std::io::Error),
}

/// Everything the gateway needs to bind its listener and spawn workers.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub project_id: String,
    pub functions_dir: PathBuf,
    pub node_binary: PathBuf,
    pub runtime_entry_path: PathBuf,
    /// Known sibling emulator ports, keyed by service name (e.g. `firestore`).
    pub sibling_port_directory: HashMap<String, u16>,
    pub disabled_features: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("FXEMU_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = match env::var("FXEMU_PORT") {
            Ok(raw) => raw.parse().map_err(ConfigError::InvalidPort)?,
            Err(_) => 5001,
        };
        let project_id = env::var("FXEMU_PROJECT_ID").unwrap_or_else(|_| "demo-project".to_string());
        let functions_dir = match env::var_os("FXEMU_FUNCTIONS_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir().map_err(ConfigError::FunctionsDir)?,
        };
        let node_binary = env::var_os("FXEMU_NODE_BINARY")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("node"));
        let runtime_entry_path = env::var_os("FXEMU_RUNTIME_ENTRY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("functions-runtime/index.js"));
        let sibling_port_directory = match env::var("FXEMU_SIBLING_PORTS") {
            Ok(raw) => parse_sibling_ports(&raw)?,
            Err(_) => HashMap::new(),
        };
        let disabled_features = match env::var("FXEMU_DISABLED_FEATURES") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        };

        Ok(Self {
            host,
            port,
            project_id,
            functions_dir,
            node_binary,
            runtime_entry_path,
            sibling_port_directory,
            disabled_features,
        })
    }

    /// Build the [`SpawnOptions`] shared by every worker this gateway spawns.
    pub fn spawn_options(&self) -> SpawnOptions {
        SpawnOptions {
            node_binary: self.node_binary.clone(),
            runtime_entry_path: self.runtime_entry_path.clone(),
            cached_triggers: None,
            extra_env: Vec::new(),
            ..Default::default()
        }
    }
}

fn parse_sibling_ports(raw: &str) -> Result<HashMap<String, u16>, ConfigError> {
    let mut ports = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, port) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidSiblingPort(entry.to_string()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::InvalidSiblingPort(entry.to_string()))?;
        ports.insert(name.to_string(), port);
    }
    Ok(ports)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
