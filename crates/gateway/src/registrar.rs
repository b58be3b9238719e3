// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publishes newly discovered event-trigger subscriptions to sibling
//! emulators.

use serde_json::Value;

use crate::error::RegistrarError;

/// Thin wrapper over a `reqwest::Client`; one instance is shared by the
/// whole gateway process.
#[derive(Debug, Clone, Default)]
pub struct SiblingRegistrar {
    client: reqwest::Client,
}

impl SiblingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// `PUT http://{host}:{port}/emulator/v1/projects/{project_id}/triggers/{name}`
    /// with body `{"eventTrigger": event_trigger}`. A literal `{}` response
    /// body is the positive acknowledgement and is logged at `info!`; any
    /// other body is ignored without retry. Transport/HTTP-level failures
    /// are returned as [`RegistrarError`] for the caller to log and swallow.
    pub async fn register(
        &self,
        sibling_host: &str,
        sibling_port: u16,
        project_id: &str,
        name: &str,
        event_trigger: &Value,
    ) -> Result<(), RegistrarError> {
        let url = format!(
            "http://{sibling_host}:{sibling_port}/emulator/v1/projects/{project_id}/triggers/{name}"
        );
        let response = self
            .client
            .put(&url)
            .json(&serde_json::json!({ "eventTrigger": event_trigger }))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await.unwrap_or(Value::Null);
        if body == serde_json::json!({}) {
            tracing::info!(name, url, "registered event trigger with sibling emulator");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "registrar_tests.rs"]
mod tests;
