// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn diagnostic_bundle_has_empty_trigger_id() {
    let bundle = RuntimeBundle::diagnostic("demo-proj", PathBuf::from("/tmp/fns"), Default::default());
    assert!(bundle.is_diagnostic());
    assert!(bundle.proto.is_none());
}

#[test]
fn round_trips_through_json() {
    let mut ports = std::collections::HashMap::new();
    ports.insert("firestore".to_string(), 8080u16);
    let bundle = RuntimeBundle {
        project_id: "demo-proj".to_string(),
        cwd: PathBuf::from("/tmp/fns"),
        trigger_id: "echo".to_string(),
        proto: Some(serde_json::json!({"hello": "world"})),
        sibling_port_directory: ports,
        disabled_features: vec!["admin".to_string()],
    };

    let json = serde_json::to_string(&bundle).expect("serialize");
    let restored: RuntimeBundle = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored.trigger_id, "echo");
    assert!(!restored.is_diagnostic());
    assert_eq!(restored.sibling_port_directory.get("firestore"), Some(&8080));
}
