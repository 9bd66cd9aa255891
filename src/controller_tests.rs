// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `controller.rs`

#[cfg(test)]
mod tests {
    use crate::controller::{referencing_objects, watch_fingerprint, ReconcileError};
    use crate::crd::Subnet;
    use crate::errors::OrcError;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn subnet(name: &str, namespace: &str, labels: Value, available: bool) -> Arc<Subnet> {
        let status = if available { "True" } else { "False" };
        Arc::new(
            serde_json::from_value(json!({
                "apiVersion": "openstack.k-orc.cloud/v1alpha1",
                "kind": "Subnet",
                "metadata": { "name": name, "namespace": namespace, "labels": labels },
                "spec": {
                    "cloud": "devstack",
                    "resource": { "networkRef": "n1", "cidr": "10.0.0.0/24" }
                },
                "status": {
                    "conditions": [{ "type": "Available", "status": status, "reason": "Success" }]
                }
            }))
            .unwrap(),
        )
    }

    fn labelled() -> Value {
        json!({ "openstack.k-orc.cloud/network-n1": "" })
    }

    #[test]
    fn test_only_unavailable_referencing_objects_in_namespace_are_enqueued() {
        let candidates = vec![
            subnet("waiting", "default", labelled(), false),
            subnet("ready", "default", labelled(), true),
            subnet("elsewhere", "other", labelled(), false),
            subnet("unrelated", "default", json!({ "openstack.k-orc.cloud/network-n2": "" }), false),
        ];

        let refs = referencing_objects(&candidates, "network", "default", "n1", true);
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["waiting"]);
        assert_eq!(refs[0].namespace.as_deref(), Some("default"));
    }

    #[test]
    fn test_available_objects_included_when_requested() {
        let candidates = vec![
            subnet("waiting", "default", labelled(), false),
            subnet("ready", "default", labelled(), true),
        ];
        let refs = referencing_objects(&candidates, "network", "default", "n1", false);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_reconcile_error_is_transparent() {
        let err = ReconcileError::from(OrcError::invalid_configuration("spec.resource is required"));
        assert!(err.to_string().contains("spec.resource is required"));
        assert!(err.inner().is_terminal());
    }

    #[test]
    fn test_fingerprint_ignores_server_side_apply_bookkeeping() {
        let before = subnet("s1", "default", labelled(), false);
        let mut after = (*before).clone();
        after.metadata.resource_version = Some("42".to_string());
        after.metadata.managed_fields = Some(vec![serde_json::from_value(json!({
            "manager": "orc",
            "operation": "Apply",
            "fieldsType": "FieldsV1",
            "fieldsV1": { "f:status": {} }
        }))
        .unwrap()]);

        assert!(watch_fingerprint(before.as_ref()).is_some());
        assert_eq!(watch_fingerprint(before.as_ref()), watch_fingerprint(&after));
    }

    #[test]
    fn test_fingerprint_tracks_status_labels_and_deletion() {
        let base = subnet("s1", "default", labelled(), false);
        let fingerprint = watch_fingerprint(base.as_ref());

        let available = subnet("s1", "default", labelled(), true);
        assert_ne!(fingerprint, watch_fingerprint(available.as_ref()));

        let relabelled = subnet("s1", "default", json!({}), false);
        assert_ne!(fingerprint, watch_fingerprint(relabelled.as_ref()));

        let mut finalized = (*base).clone();
        finalized.metadata.finalizers = Some(vec!["openstack.k-orc.cloud/subnet".to_string()]);
        assert_ne!(fingerprint, watch_fingerprint(&finalized));

        let mut deleting = finalized.clone();
        deleting.metadata.deletion_timestamp =
            Some(serde_json::from_value(json!("2025-01-01T00:00:00Z")).unwrap());
        assert_ne!(watch_fingerprint(&finalized), watch_fingerprint(&deleting));

        let mut respecced = (*base).clone();
        respecced.spec.cloud = "other".to_string();
        assert_ne!(fingerprint, watch_fingerprint(&respecced));
    }
}
