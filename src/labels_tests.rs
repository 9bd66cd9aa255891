// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `labels.rs`

#[cfg(test)]
mod tests {
    use crate::labels::{
        cloud_secret_finalizer, dependency_label, dependency_labels, field_owner, finalizer,
        has_prefix, replace_prefixed, ORC_LABEL_PREFIX,
    };
    use std::collections::BTreeMap;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_names() {
        assert_eq!(finalizer("port"), "openstack.k-orc.cloud/port");
        assert_eq!(
            field_owner("network", "status"),
            "openstack.k-orc.cloud/networkcontroller/status"
        );
        assert_eq!(
            dependency_label("subnet", "s1"),
            "openstack.k-orc.cloud/subnet-s1"
        );
        assert_eq!(
            cloud_secret_finalizer("devstack"),
            "openstackcloud.k-orc.cloud/devstack"
        );
    }

    #[test]
    fn test_has_prefix_exact_and_subdomain() {
        assert!(has_prefix(ORC_LABEL_PREFIX, "openstack.k-orc.cloud/network-n1"));
        assert!(has_prefix(ORC_LABEL_PREFIX, "port.openstack.k-orc.cloud/p1"));
        assert!(!has_prefix(ORC_LABEL_PREFIX, "xopenstack.k-orc.cloud/p1"));
        assert!(!has_prefix(ORC_LABEL_PREFIX, "example.com/network-n1"));
        assert!(!has_prefix(ORC_LABEL_PREFIX, "openstack.k-orc.cloud"));
    }

    #[test]
    fn test_replace_prefixed_preserves_foreign_labels() {
        let current = labels(&[
            ("app", "web"),
            ("openstack.k-orc.cloud/network-old", ""),
        ]);
        let desired = labels(&[("openstack.k-orc.cloud/network-n1", "")]);

        let (merged, changed) = replace_prefixed(ORC_LABEL_PREFIX, &current, &desired);

        assert!(changed);
        assert_eq!(
            merged,
            labels(&[("app", "web"), ("openstack.k-orc.cloud/network-n1", "")])
        );
    }

    #[test]
    fn test_replace_prefixed_unchanged() {
        let current = labels(&[("app", "web"), ("openstack.k-orc.cloud/cloud-c1", "")]);
        let desired = labels(&[("openstack.k-orc.cloud/cloud-c1", "")]);

        let (merged, changed) = replace_prefixed(ORC_LABEL_PREFIX, &current, &desired);

        assert!(!changed);
        assert_eq!(merged, current);
    }

    #[test]
    fn test_replace_prefixed_removes_all_owned_when_desired_empty() {
        let current = labels(&[("openstack.k-orc.cloud/cloud-c1", ""), ("team", "a")]);

        let (merged, changed) = replace_prefixed(ORC_LABEL_PREFIX, &current, &BTreeMap::new());

        assert!(changed);
        assert_eq!(merged, labels(&[("team", "a")]));
    }

    #[test]
    fn test_dependency_labels_deduplicates() {
        let deps = dependency_labels([("subnet", "s1"), ("subnet", "s1"), ("network", "n1")]);
        assert_eq!(deps.len(), 2);
        assert!(deps.values().all(String::is_empty));
    }
}
