// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Server-side apply with named field owners.
//!
//! Every write the engine makes goes through [`apply`] or [`apply_status`]:
//!
//! - finalizers and dependency labels under the `finalizer` owner
//! - conditions and the resource mirror under the `status` owner
//! - `status.id` under the `id` owner
//!
//! Patches never include `spec`. Callers may pass extra `exclude` paths which
//! are removed from the serialized patch before it is sent.

use crate::errors::{is_kube_not_found, OrcError};
use kube::api::{Patch, PatchParams};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::debug;

/// Paths that are stripped from every patch.
pub const ALWAYS_EXCLUDED: &[&str] = &["spec"];

/// Skeleton of an apply patch: `apiVersion`, `kind` and `metadata.name`/`namespace`.
#[must_use]
pub fn envelope<K>(name: &str, namespace: Option<&str>) -> Value
where
    K: Resource<DynamicType = ()>,
{
    let mut metadata = Map::new();
    metadata.insert("name".to_string(), Value::String(name.to_string()));
    if let Some(ns) = namespace {
        metadata.insert("namespace".to_string(), Value::String(ns.to_string()));
    }
    json!({
        "apiVersion": K::api_version(&()),
        "kind": K::kind(&()),
        "metadata": metadata,
    })
}

/// Remove each dotted path in `paths` from `patch`. Missing paths are ignored.
pub fn exclude_paths(patch: &mut Value, paths: &[&str]) {
    for path in paths {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            continue;
        };

        let mut cursor = Some(&mut *patch);
        for segment in segments {
            cursor = cursor.and_then(|v| v.get_mut(segment));
        }
        if let Some(Value::Object(map)) = cursor {
            map.remove(last);
        }
    }
}

/// Finalizer-owner patch: our finalizer (when `Some`) plus our labels.
///
/// Passing `None` for `finalizer` releases it: server-side apply drops fields
/// the owner previously set but no longer specifies.
#[must_use]
pub fn finalizer_patch<K>(
    obj: &K,
    finalizer: Option<&str>,
    labels: &BTreeMap<String, String>,
) -> Value
where
    K: Resource<DynamicType = ()>,
{
    let mut patch = envelope::<K>(&obj.name_any(), obj.meta().namespace.as_deref());
    let finalizers: Vec<&str> = finalizer.into_iter().collect();
    patch["metadata"]["finalizers"] = json!(finalizers);
    if !labels.is_empty() {
        patch["metadata"]["labels"] = json!(labels);
    }
    patch
}

/// Status-subresource patch carrying `status`.
#[must_use]
pub fn status_patch<K>(obj: &K, status: Value) -> Value
where
    K: Resource<DynamicType = ()>,
{
    let mut patch = envelope::<K>(&obj.name_any(), obj.meta().namespace.as_deref());
    patch["status"] = status;
    patch
}

/// Server-side apply `patch` to the object, forcing ownership for `field_owner`.
///
/// # Errors
///
/// Returns an error if the API server rejects the patch.
pub async fn apply<K>(
    api: &Api<K>,
    name: &str,
    mut patch: Value,
    exclude: &[&str],
    field_owner: &str,
) -> Result<K, OrcError>
where
    K: Clone + DeserializeOwned + Debug,
{
    exclude_paths(&mut patch, ALWAYS_EXCLUDED);
    exclude_paths(&mut patch, exclude);
    debug!(name, field_owner, "Applying patch");

    let params = PatchParams::apply(field_owner).force();
    Ok(api.patch(name, &params, &Patch::Apply(&patch)).await?)
}

/// Same as [`apply`] against the status subresource.
///
/// # Errors
///
/// Returns an error if the API server rejects the patch.
pub async fn apply_status<K>(
    api: &Api<K>,
    name: &str,
    mut patch: Value,
    exclude: &[&str],
    field_owner: &str,
) -> Result<K, OrcError>
where
    K: Clone + DeserializeOwned + Debug,
{
    exclude_paths(&mut patch, ALWAYS_EXCLUDED);
    exclude_paths(&mut patch, exclude);
    debug!(name, field_owner, "Applying status patch");

    let params = PatchParams::apply(field_owner).force();
    Ok(api
        .patch_status(name, &params, &Patch::Apply(&patch))
        .await?)
}

/// Remove label keys regardless of which owner set them.
///
/// Used for stale engine-owned labels another writer placed on the object.
///
/// # Errors
///
/// Returns an error if the API server rejects the patch.
pub async fn remove_labels<K>(api: &Api<K>, name: &str, keys: &[String]) -> Result<(), OrcError>
where
    K: Clone + DeserializeOwned + Debug,
{
    if keys.is_empty() {
        return Ok(());
    }
    let labels: Map<String, Value> = keys.iter().map(|k| (k.clone(), Value::Null)).collect();
    let patch = json!({ "metadata": { "labels": labels } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Treat a Kubernetes NotFound as success. Used once our finalizer is gone and
/// the object may already have been garbage collected.
///
/// # Errors
///
/// Returns any error other than NotFound.
pub fn ignore_not_found<T>(result: Result<T, OrcError>) -> Result<Option<T>, OrcError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(OrcError::Kube(ref e)) if is_kube_not_found(e) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod apply_tests;
