// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label, finalizer and field-owner names used across all reconcilers.
//!
//! Every key under [`ORC_LABEL_PREFIX`] is owned by the controller. Dependency
//! labels of the form `openstack.k-orc.cloud/<kind>-<name>` form a reverse
//! index: when a sibling object changes, dependents are found by listing objects
//! that carry the sibling's label.

use std::collections::BTreeMap;

// ============================================================================
// Prefixes
// ============================================================================

/// Label and finalizer prefix owned by the controller
pub const ORC_LABEL_PREFIX: &str = "openstack.k-orc.cloud";

/// Prefix for the finalizer a `Cloud` places on its credentials `Secret`
pub const CLOUD_SECRET_FINALIZER_PREFIX: &str = "openstackcloud.k-orc.cloud";

// ============================================================================
// Field-owner transactions
// ============================================================================

/// Field-owner transaction used for finalizers and dependency labels
pub const TXN_FINALIZER: &str = "finalizer";

/// Field-owner transaction used for status conditions and the resource mirror
pub const TXN_STATUS: &str = "status";

/// Field-owner transaction used for `status.id`
pub const TXN_ID: &str = "id";

/// Name of the finalizer the controller owns on objects of `label_kind`.
///
/// ```rust
/// assert_eq!(orc::labels::finalizer("network"), "openstack.k-orc.cloud/network");
/// ```
#[must_use]
pub fn finalizer(label_kind: &str) -> String {
    format!("{ORC_LABEL_PREFIX}/{label_kind}")
}

/// Field owner for one apply transaction of a kind controller.
#[must_use]
pub fn field_owner(label_kind: &str, txn: &str) -> String {
    format!("{ORC_LABEL_PREFIX}/{label_kind}controller/{txn}")
}

/// Dependency label key identifying a sibling object.
///
/// ```rust
/// assert_eq!(
///     orc::labels::dependency_label("network", "n1"),
///     "openstack.k-orc.cloud/network-n1"
/// );
/// ```
#[must_use]
pub fn dependency_label(dep_kind: &str, dep_name: &str) -> String {
    format!("{ORC_LABEL_PREFIX}/{dep_kind}-{dep_name}")
}

/// Finalizer a `Cloud` places on its credentials secret.
#[must_use]
pub fn cloud_secret_finalizer(cloud_name: &str) -> String {
    format!("{CLOUD_SECRET_FINALIZER_PREFIX}/{cloud_name}")
}

/// Whether `key` lives under `prefix`.
///
/// A key matches when the part before `/` equals `prefix` or ends with
/// `.<prefix>`. Keys without a `/` never match.
#[must_use]
pub fn has_prefix(prefix: &str, key: &str) -> bool {
    match key.split_once('/') {
        Some((key_prefix, _)) => {
            key_prefix == prefix
                || key_prefix
                    .strip_suffix(prefix)
                    .is_some_and(|rest| rest.ends_with('.'))
        }
        None => false,
    }
}

/// Replace every label under `prefix` with `desired`, preserving foreign labels.
///
/// Returns the merged map and whether it differs from `current`.
#[must_use]
pub fn replace_prefixed(
    prefix: &str,
    current: &BTreeMap<String, String>,
    desired: &BTreeMap<String, String>,
) -> (BTreeMap<String, String>, bool) {
    let mut merged: BTreeMap<String, String> = current
        .iter()
        .filter(|(key, _)| !has_prefix(prefix, key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    merged.extend(desired.iter().map(|(k, v)| (k.clone(), v.clone())));

    let changed = &merged != current;
    (merged, changed)
}

/// Build the label map for a set of dependency references.
#[must_use]
pub fn dependency_labels<'a, I>(deps: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    deps.into_iter()
        .map(|(kind, name)| (dependency_label(kind, name), String::new()))
        .collect()
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod labels_tests;
