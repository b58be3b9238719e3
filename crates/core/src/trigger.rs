// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger definitions discovered from a developer's functions project.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Services a non-HTTP trigger may bind to that the gateway can actually
/// act on. Anything else is retained in the table but fails invocations
/// with `UnsupportedTrigger`.
pub const SUPPORTED_EVENT_SERVICES: &[&str] = &["firestore"];

/// One user-authored function: an HTTP route or an event subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: TriggerKind,
}

/// The two trigger shapes a project can register. Exactly one applies per
/// trigger (enforced by the `#[serde(flatten)]` + internal tag below).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "triggerKind", rename_all = "camelCase")]
pub enum TriggerKind {
    Http {
        region: String,
    },
    Event {
        service: String,
        region: String,
        event_trigger: serde_json::Value,
    },
}

impl TriggerDefinition {
    /// Whether this trigger is one the gateway knows how to invoke: any HTTP
    /// trigger, or an event trigger whose service is in the allow-list.
    pub fn is_supported(&self) -> bool {
        match &self.kind {
            TriggerKind::Http { .. } => true,
            TriggerKind::Event { service, .. } => {
                SUPPORTED_EVENT_SERVICES.contains(&service.as_str())
            }
        }
    }

    pub fn region(&self) -> &str {
        match &self.kind {
            TriggerKind::Http { region } => region,
            TriggerKind::Event { region, .. } => region,
        }
    }

    /// Public HTTP URL for an HTTP trigger.
    pub fn public_url(&self, host: &str, port: u16, project_id: &str) -> Option<String> {
        match &self.kind {
            TriggerKind::Http { region } => Some(format!(
                "http://{host}:{port}/{project_id}/{region}/{name}",
                name = self.name
            )),
            TriggerKind::Event { .. } => None,
        }
    }
}

/// Mapping from trigger name to definition. Replaced wholesale by each
/// successful reload; never mutated in place (see `fxemu-gateway::loader`
/// for the pointer-swap publication).
pub type TriggerTable = HashMap<String, TriggerDefinition>;

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
